//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Resample | `image::imageops::resize` with `Lanczos3` filter |
//! | Baked scale/rotate | `imageproc::geometric_transformations::warp_into` (bicubic) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Bitmap, Dimensions, ImageBackend};
use super::params::{BakedTransform, RenderParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::io::Cursor;

/// Fill for output pixels not covered by the rotated/scaled source.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

const OUTPUT_MIME: &str = "image/jpeg";

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the source into a drawable surface.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| {
        BackendError::RenderingUnavailable(format!("cannot decode source image: {}", e))
    })
}

/// Copy the natural-space region into an `output_width × output_height` surface.
fn crop_region(img: &DynamicImage, params: &RenderParams<'_>) -> DynamicImage {
    let r = params.region;
    let region = img.crop_imm(r.x, r.y, r.width, r.height);
    if (r.width, r.height) == (params.output_width, params.output_height) {
        region
    } else {
        region.resize_exact(
            params.output_width,
            params.output_height,
            FilterType::Lanczos3,
        )
    }
}

/// Build the forward projection natural pixel → output pixel.
///
/// Composition, applied right to left: natural → display, scale and rotate
/// about the display centre, shift to the crop origin, stretch to the output.
fn baked_projection(b: &BakedTransform, output_width: u32, output_height: u32) -> Projection {
    let cx = (b.display_width / 2.0) as f32;
    let cy = (b.display_height / 2.0) as f32;
    let kx = (output_width as f64 / b.crop_width) as f32;
    let ky = (output_height as f64 / b.crop_height) as f32;
    let theta = (b.rotate_degrees as f32).to_radians();
    let s = b.scale as f32;

    Projection::scale(kx, ky)
        * Projection::translate(-b.crop_x as f32, -b.crop_y as f32)
        * Projection::translate(cx, cy)
        * Projection::rotate(theta)
        * Projection::scale(s, s)
        * Projection::translate(-cx, -cy)
        * Projection::scale(1.0 / b.scale_x as f32, 1.0 / b.scale_y as f32)
}

/// Render with the preview transform baked in.
fn warp_baked(img: &DynamicImage, params: &RenderParams<'_>, b: &BakedTransform) -> DynamicImage {
    let source = img.to_rgba8();
    let projection = baked_projection(b, params.output_width, params.output_height);
    let mut out = RgbaImage::from_pixel(params.output_width, params.output_height, BACKGROUND);
    warp_into(
        &source,
        &projection,
        Interpolation::Bicubic,
        BACKGROUND,
        &mut out,
    );
    DynamicImage::ImageRgba8(out)
}

/// Encode as JPEG at the requested quality.
fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100) as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to sniff format: {}", e)))?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn render(&self, params: &RenderParams<'_>) -> Result<Bitmap, BackendError> {
        let img = load_image(params.source)?;

        let surface = match &params.baked {
            Some(baked) => warp_baked(&img, params, baked),
            None => crop_region(&img, params),
        };

        let bytes = encode_jpeg(&surface, params.quality.value())?;
        Ok(Bitmap {
            width: surface.width(),
            height: surface.height(),
            mime_type: OUTPUT_MIME.to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Quality, SourceRect};
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use image::GenericImageView;

    fn full_region(width: u32, height: u32) -> SourceRect {
        SourceRect {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let backend = RustBackend::new();
        let dims = backend.identify(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_png() {
        let dims = RustBackend::new().identify(&png_bytes(31, 17)).unwrap();
        assert_eq!((dims.width, dims.height), (31, 17));
    }

    #[test]
    fn identify_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.identify(b"definitely not an image").is_err());
    }

    #[test]
    fn render_garbage_is_rendering_unavailable() {
        let result = RustBackend::new().render(&RenderParams {
            source: b"nope",
            region: full_region(1, 1),
            output_width: 1,
            output_height: 1,
            quality: Quality::default(),
            baked: None,
        });
        assert!(matches!(result, Err(BackendError::RenderingUnavailable(_))));
    }

    #[test]
    fn render_crop_produces_jpeg_of_output_size() {
        let source = jpeg_bytes(400, 300);
        let bitmap = RustBackend::new()
            .render(&RenderParams {
                source: &source,
                region: SourceRect {
                    x: 50,
                    y: 0,
                    width: 300,
                    height: 300,
                },
                output_width: 300,
                output_height: 300,
                quality: Quality::new(90),
                baked: None,
            })
            .unwrap();

        assert_eq!((bitmap.width, bitmap.height), (300, 300));
        assert_eq!(bitmap.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&bitmap.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (300, 300));
    }

    #[test]
    fn render_resamples_when_region_differs_from_output() {
        let source = jpeg_bytes(800, 600);
        let bitmap = RustBackend::new()
            .render(&RenderParams {
                source: &source,
                region: full_region(800, 600),
                output_width: 200,
                output_height: 150,
                quality: Quality::new(80),
                baked: None,
            })
            .unwrap();

        let decoded = image::load_from_memory(&bitmap.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 150));
    }

    #[test]
    fn render_png_source_to_jpeg() {
        let source = png_bytes(64, 64);
        let bitmap = RustBackend::new()
            .render(&RenderParams {
                source: &source,
                region: full_region(32, 32),
                output_width: 32,
                output_height: 32,
                quality: Quality::default(),
                baked: None,
            })
            .unwrap();
        assert_eq!(image::guess_format(&bitmap.bytes).unwrap(), image::ImageFormat::Jpeg);
    }

    fn baked(rotate_degrees: i32, scale: f64) -> BakedTransform {
        BakedTransform {
            display_width: 100.0,
            display_height: 100.0,
            crop_x: 0.0,
            crop_y: 0.0,
            crop_width: 100.0,
            crop_height: 100.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scale,
            rotate_degrees,
        }
    }

    #[test]
    fn baked_identity_projection_maps_points_to_themselves() {
        let p = baked_projection(&baked(0, 1.0), 100, 100);
        let (x, y) = p * (25.0, 75.0);
        assert!((x - 25.0).abs() < 1e-3 && (y - 75.0).abs() < 1e-3);
    }

    #[test]
    fn baked_quarter_turn_rotates_about_centre() {
        // Clockwise in screen space: the top-centre point lands on the right-centre
        let p = baked_projection(&baked(90, 1.0), 100, 100);
        let (x, y) = p * (50.0, 0.0);
        assert!((x - 100.0).abs() < 1e-3, "x = {x}");
        assert!((y - 50.0).abs() < 1e-3, "y = {y}");
    }

    #[test]
    fn baked_scale_zooms_about_centre() {
        let p = baked_projection(&baked(0, 2.0), 100, 100);
        let (x, y) = p * (25.0, 25.0);
        assert!((x - 0.0).abs() < 1e-3 && (y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn render_baked_keeps_output_size() {
        let source = jpeg_bytes(100, 100);
        let bitmap = RustBackend::new()
            .render(&RenderParams {
                source: &source,
                region: full_region(100, 100),
                output_width: 60,
                output_height: 40,
                quality: Quality::default(),
                baked: Some(BakedTransform {
                    crop_x: 20.0,
                    crop_y: 30.0,
                    crop_width: 60.0,
                    crop_height: 40.0,
                    ..baked(45, 1.5)
                }),
            })
            .unwrap();

        assert_eq!((bitmap.width, bitmap.height), (60, 40));
        let decoded = image::load_from_memory(&bitmap.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (60, 40));
    }
}
