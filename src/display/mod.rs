//! Display Resolution & Fallback Chain.
//!
//! ```text
//! StoredPath ─▶ empty / sentinel? ──yes──▶ placeholder
//!                  │ no
//!                  ▼
//!              UrlCache hit? ──yes──▶ <img src=url>
//!                  │ no
//!                  ▼
//!              PathRule ─▶ cache ─▶ <img src=url> ──load failure──▶ placeholder (for good)
//! ```
//!
//! - **cache**: [`UrlCache`] service and [`MemoryUrlCache`]
//! - **resolver**: [`PathRule`], sentinels, [`DisplayResolver`]
//! - **placeholder**: [`Category`] style table and SVG rendering
//! - **view**: [`ImageView`], the per-slot component with one-way fallback

mod cache;
mod placeholder;
mod resolver;
mod view;

pub use cache::{CacheStats, MemoryUrlCache, UrlCache};
pub use placeholder::{
    Category, CategoryStyle, placeholder_data_url, placeholder_markup, placeholder_svg,
};
pub use resolver::{BaseUrlRule, DisplayResolver, PathRule, Resolution};
pub use view::{DisplayError, ImageView, Rendering};
