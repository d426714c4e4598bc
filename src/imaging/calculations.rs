//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Crop regions arriving here are already in pixel units of the displayed
//! image (see [`CropRegion::to_pixels`]).

use super::backend::Dimensions;
use super::params::{CropRegion, SourceRect};

/// Largest output surface (in pixels) the engine will allocate.
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

/// Natural pixels per displayed pixel, per axis.
///
/// The displayed element may be laid out smaller or larger than the file's
/// natural resolution. A zero-sized display is treated as natural size.
///
/// # Examples
/// ```
/// # use picture_intake::imaging::{Dimensions, natural_scale};
/// let natural = Dimensions { width: 2048, height: 1536 };
/// let display = Dimensions { width: 1024, height: 768 };
/// assert_eq!(natural_scale(natural, display), (2.0, 2.0));
/// ```
pub fn natural_scale(natural: Dimensions, display: Dimensions) -> (f64, f64) {
    let sx = if display.width == 0 {
        1.0
    } else {
        natural.width as f64 / display.width as f64
    };
    let sy = if display.height == 0 {
        1.0
    } else {
        natural.height as f64 / display.height as f64
    };
    (sx, sy)
}

/// Map a display-space crop onto the natural pixel grid.
///
/// The result is rounded to whole pixels and kept inside the natural bounds,
/// with at least one pixel on each side.
pub fn map_to_natural(crop: &CropRegion, scale: (f64, f64), natural: Dimensions) -> SourceRect {
    let (sx, sy) = scale;
    let max_x = natural.width.saturating_sub(1);
    let max_y = natural.height.saturating_sub(1);

    let x = ((crop.x * sx).round().max(0.0) as u32).min(max_x);
    let y = ((crop.y * sy).round().max(0.0) as u32).min(max_y);
    let width = ((crop.width * sx).round().max(1.0) as u32).min(natural.width - x);
    let height = ((crop.height * sy).round().max(1.0) as u32).min(natural.height - y);

    SourceRect {
        x,
        y,
        width: width.max(1),
        height: height.max(1),
    }
}

/// Raster size for a display-space crop: its width and height, rounded.
pub fn output_dimensions(crop: &CropRegion) -> (u32, u32) {
    (
        crop.width.round().max(0.0) as u32,
        crop.height.round().max(0.0) as u32,
    )
}

/// Whether a surface of this size can be allocated.
pub fn surface_fits(width: u32, height: u32) -> bool {
    width as u64 * height as u64 <= MAX_SURFACE_PIXELS
}

/// Compute the initial crop when an aspect ratio is configured.
///
/// The box starts at `coverage` (e.g. 0.9) of the displayed width, takes its
/// height from the aspect ratio, and shrinks to fit whichever side would
/// overflow. It is then centred.
///
/// # Arguments
/// * `display` - Displayed image size
/// * `aspect` - Target width / height
/// * `coverage` - Fraction of the displayed width to start from
///
/// # Examples
/// ```
/// # use picture_intake::imaging::{CropRegion, Dimensions, centered_aspect_crop};
/// // 1024x768 landscape, square crop → full-height 768x768 box in the middle
/// let crop = centered_aspect_crop(Dimensions { width: 1024, height: 768 }, 1.0, 0.9);
/// assert_eq!(crop, CropRegion::pixels(128.0, 0.0, 768.0, 768.0));
/// ```
pub fn centered_aspect_crop(display: Dimensions, aspect: f64, coverage: f64) -> CropRegion {
    let (dw, dh) = (display.width as f64, display.height as f64);

    let mut width = dw * coverage;
    let mut height = width / aspect;

    if height > dh {
        // Too tall: pin the height, derive the width
        height = dh;
        width = height * aspect;
    }
    if width > dw {
        width = dw;
        height = width / aspect;
    }

    CropRegion::pixels((dw - width) / 2.0, (dh - height) / 2.0, width, height)
}

/// Keep a pixel crop inside the displayed image.
///
/// Oversized boxes shrink to the display; the origin then slides so the box
/// stays fully inside. NaN components count as zero.
pub fn clamp_crop(crop: &CropRegion, display: Dimensions) -> CropRegion {
    let (dw, dh) = (display.width as f64, display.height as f64);
    let or_zero = |v: f64| if v.is_nan() { 0.0 } else { v };
    let width = or_zero(crop.width).clamp(0.0, dw);
    let height = or_zero(crop.height).clamp(0.0, dh);
    let x = or_zero(crop.x).clamp(0.0, dw - width);
    let y = or_zero(crop.y).clamp(0.0, dh - height);
    CropRegion::pixels(x, y, width, height)
}
