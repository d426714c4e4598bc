//! Image processing: the Transform Engine.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop → JPEG** | `crop_imm` + Lanczos3 resample + `JpegEncoder` (quality 90) |
//! | **Baked scale/rotate** | `imageproc` projective warp |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing crops, transforms and renders
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Bitmap, Dimensions, ImageBackend};
pub use calculations::{centered_aspect_crop, clamp_crop, natural_scale};
pub use operations::{RenderOptions, get_dimensions, plan_render, render};
pub use params::{
    AspectRatio, BakedTransform, CropRegion, CropUnit, Quality, RenderParams, SourceRect,
    Transform,
};
pub use rust_backend::RustBackend;
