//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which pixels end up in the output) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing the geometry.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropRegion`]: User-drawn rectangle, in percent or pixel units, relative to the displayed image.
//! - [`Transform`]: Preview scale (0.5–2.0) and rotation (−180°–180°). Clamped on construction.
//! - [`AspectRatio`]: Width:height constraint for the crop box.
//! - [`SourceRect`]: Crop rectangle mapped onto the natural pixel grid.
//! - [`BakedTransform`]: Geometry needed to bake the preview transform into the raster.
//! - [`RenderParams`]: Everything one render needs (source bytes, region, output size and quality).

use super::backend::Dimensions;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Unit of a [`CropRegion`]'s coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropUnit {
    /// Percent (0–100) of the displayed width/height.
    Percent,
    /// Pixels of the displayed image.
    Pixel,
}

/// A crop rectangle relative to the *displayed*, unscaled and unrotated image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub unit: CropUnit,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Pixel,
            x,
            y,
            width,
            height,
        }
    }

    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    /// Express this region in pixel units of the given display size.
    pub fn to_pixels(&self, display: Dimensions) -> Self {
        match self.unit {
            CropUnit::Pixel => *self,
            CropUnit::Percent => {
                let (dw, dh) = (display.width as f64, display.height as f64);
                Self::pixels(
                    self.x * dw / 100.0,
                    self.y * dh / 100.0,
                    self.width * dw / 100.0,
                    self.height * dh / 100.0,
                )
            }
        }
    }

    /// Whether the region has a positive area.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Preview-only scale and rotation controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    scale: f64,
    rotate_degrees: i32,
}

impl Transform {
    pub const MIN_SCALE: f64 = 0.5;
    pub const MAX_SCALE: f64 = 2.0;
    pub const MAX_ROTATION: i32 = 180;

    pub fn new(scale: f64, rotate_degrees: i32) -> Self {
        let scale = if scale.is_finite() { scale } else { 1.0 };
        Self {
            scale: scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE),
            rotate_degrees: rotate_degrees.clamp(-Self::MAX_ROTATION, Self::MAX_ROTATION),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotate_degrees(&self) -> i32 {
        self.rotate_degrees
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.rotate_degrees == 0
    }

    /// CSS `transform` value that restyles the live preview.
    pub fn to_css(&self) -> String {
        format!("scale({}) rotate({}deg)", self.scale, self.rotate_degrees)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotate_degrees: 0,
        }
    }
}

/// Width:height constraint for the crop box, e.g. `1:1` for avatars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Returns `None` when either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn value(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    /// Parses `"16:9"` or `"16/9"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(|c| c == ':' || c == '/')
            .ok_or_else(|| format!("expected W:H, got '{s}'"))?;
        let w: u32 = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
        let h: u32 = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
        Self::new(w, h).ok_or_else(|| format!("aspect ratio sides must be non-zero: '{s}'"))
    }
}

/// A crop rectangle on the source's natural pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Everything the backend needs to bake scale and rotation into the raster.
///
/// The preview rotates and scales the displayed image about its centre; the
/// crop box stays in the untransformed display frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakedTransform {
    /// Displayed image size.
    pub display_width: f64,
    pub display_height: f64,
    /// Crop box origin in display pixels.
    pub crop_x: f64,
    pub crop_y: f64,
    /// Crop box size in display pixels.
    pub crop_width: f64,
    pub crop_height: f64,
    /// Natural pixels per displayed pixel, per axis.
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale: f64,
    pub rotate_degrees: i32,
}

/// Parameters for a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams<'a> {
    /// Encoded source image bytes.
    pub source: &'a [u8],
    /// Region to copy, in natural pixels. Ignored when `baked` is set.
    pub region: SourceRect,
    pub output_width: u32,
    pub output_height: u32,
    pub quality: Quality,
    pub baked: Option<BakedTransform>,
}
