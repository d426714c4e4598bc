//! # Picture Intake
//!
//! Image acquisition, crop/transform, upload, and resilient display for
//! content-management front ends. An operator picks or drops a raw image,
//! crops it (optionally scaling and rotating the preview), and the pipeline
//! turns the committed crop into a JPEG blob, hands it to a storage
//! collaborator, and later displays the stored path with a deterministic
//! placeholder whenever the image is missing or fails to load.
//!
//! # Architecture
//!
//! ```text
//! SelectedFile ─▶ Acquisition ─▶ CropSession ─▶ imaging::render ─▶ UploadBlob
//!                                                                    │
//!                     ImageView ◀─ DisplayResolver ◀─ StoredPath ◀─ Uploader
//! ```
//!
//! Each stage is testable on its own: geometry is pure functions, pixel work
//! sits behind [`imaging::ImageBackend`], the network behind
//! [`upload::Uploader`], and URL memoization behind [`display::UrlCache`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Transform Engine: crop geometry, render planning, `image`/`imageproc` backend |
//! | [`session`] | Crop Session Controller: live vs committed crop, preview transform |
//! | [`source`] | File intake: validation, MIME guessing, decoded source image |
//! | [`acquire`] | Acquisition Orchestrator: session states, upload tickets, retry |
//! | [`upload`] | Upload Resolver: blob wrapping and the HTTP uploader |
//! | [`display`] | Display chain: URL cache, path rule, category placeholders, image view |
//! | [`config`] | `pipeline.toml` loading, validation, and merging |
//! | [`types`] | Shared types (`StoredPath`, `UploadTarget`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Crop-Only Export
//!
//! Crop coordinates are defined against the unscaled, unrotated displayed
//! image, and scale/rotation only restyle the preview. The exported raster is
//! the plain crop unless `crop.bake_preview_transform` is enabled, in which
//! case the preview transform is composed about the display centre before
//! cropping.
//!
//! ## Retain and Retry
//!
//! A failed upload keeps the rendered blob and the committed crop. The
//! session returns to cropping and a retry sends the same bytes again
//! without re-rendering.
//!
//! ## Injected URL Cache
//!
//! Resolved URLs are memoized in a cache service handed to each resolver,
//! not in hidden global state. Clones of [`display::MemoryUrlCache`] share
//! entries for the life of the process.

pub mod acquire;
pub mod config;
pub mod display;
pub mod imaging;
pub mod output;
pub mod session;
pub mod source;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
