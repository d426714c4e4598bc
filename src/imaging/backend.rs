//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs
//! from a pixel engine: identify (read natural dimensions) and render (copy a
//! region into a fresh surface and encode it).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording [`MockBackend`](tests::MockBackend).

use super::params::RenderParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Crop region is empty ({width}x{height}); drag a selection first")]
    EmptyCropRegion { width: f64, height: f64 },
    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An encoded raster produced by a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Trait for image backends.
pub trait ImageBackend: Sync {
    /// Decode just enough of `bytes` to report natural dimensions.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Execute a render: crop (or warp) into the output surface, then encode.
    fn render(&self, params: &RenderParams<'_>) -> Result<Bitmap, BackendError>;
}
