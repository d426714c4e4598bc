//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take a
//! source image and a crop, compute render parameters, and call the backend.
//! [`render`] is the Transform Engine entry point used by crop sessions.

use super::backend::{BackendError, Bitmap, Dimensions, ImageBackend};
use super::calculations::{map_to_natural, natural_scale, output_dimensions, surface_fits};
use super::params::{BakedTransform, CropRegion, Quality, RenderParams, Transform};
use crate::source::SourceImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get natural image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, bytes: &[u8]) -> Result<Dimensions> {
    backend.identify(bytes)
}

/// Options that shape the exported raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Fixed output size; `None` exports at crop size.
    pub output_size: Option<Dimensions>,
    pub quality: Quality,
    /// Bake the preview scale/rotation into the raster instead of exporting
    /// the plain crop.
    pub bake_preview_transform: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            output_size: None,
            quality: Quality::default(),
            bake_preview_transform: false,
        }
    }
}

/// Plan a render without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_render<'a>(
    source: &'a SourceImage,
    crop: &CropRegion,
    transform: &Transform,
    options: &RenderOptions,
) -> Result<RenderParams<'a>> {
    let display = source.display();
    let crop = crop.to_pixels(display);

    let (crop_w, crop_h) = output_dimensions(&crop);
    if !crop.has_area() || crop_w == 0 || crop_h == 0 {
        return Err(BackendError::EmptyCropRegion {
            width: crop.width,
            height: crop.height,
        });
    }

    let (output_width, output_height) = options
        .output_size
        .map(|d| (d.width, d.height))
        .unwrap_or((crop_w, crop_h));
    if output_width == 0 || output_height == 0 || !surface_fits(output_width, output_height) {
        return Err(BackendError::RenderingUnavailable(format!(
            "cannot allocate a {}x{} output surface",
            output_width, output_height
        )));
    }

    let (scale_x, scale_y) = natural_scale(source.natural(), display);
    let region = map_to_natural(&crop, (scale_x, scale_y), source.natural());

    let baked = (options.bake_preview_transform && !transform.is_identity()).then(|| {
        BakedTransform {
            display_width: display.width as f64,
            display_height: display.height as f64,
            crop_x: crop.x,
            crop_y: crop.y,
            crop_width: crop.width,
            crop_height: crop.height,
            scale_x,
            scale_y,
            scale: transform.scale(),
            rotate_degrees: transform.rotate_degrees(),
        }
    });

    Ok(RenderParams {
        source: source.bytes(),
        region,
        output_width,
        output_height,
        quality: options.quality,
        baked,
    })
}

/// Render a crop of `source` into an encoded bitmap.
///
/// The output is `crop.width × crop.height` pixels unless
/// [`RenderOptions::output_size`] overrides it. `transform` only affects the
/// raster when baking is enabled.
pub fn render(
    backend: &impl ImageBackend,
    source: &SourceImage,
    crop: &CropRegion,
    transform: &Transform,
    options: &RenderOptions,
) -> Result<Bitmap> {
    let params = plan_render(source, crop, transform, options)?;
    tracing::debug!(
        region = ?params.region,
        output_width = params.output_width,
        output_height = params.output_height,
        baked = params.baked.is_some(),
        "Rendering crop"
    );
    backend.render(&params)
}
