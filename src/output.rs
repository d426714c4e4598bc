//! CLI output formatting for the pipeline commands.
//!
//! Output leads with what the operator cares about (the image, the stored
//! path, the URL) and shows details as indented context lines:
//!
//! ## Crop
//!
//! ```text
//! photo.jpg (1024×768)
//!     Crop: 768×768 at (128, 0)
//!     Transform: scale(1.5) rotate(90deg)
//!     Output: 768×768 image/jpeg, 81.2 KiB → out.jpg
//! ```
//!
//! ## Upload
//!
//! ```text
//! news ← photo.jpg (81.2 KiB)
//!     Digest: 3f2a9c01d4e7
//!     Stored: news/abc123.jpg
//! ```
//!
//! ## Resolve
//!
//! ```text
//! news/abc123.jpg → http://localhost:8080/static/news/abc123.jpg
//!     Cache: 1 resolved
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::display::{CacheStats, Category, Rendering};
use crate::imaging::{Bitmap, CropRegion, Transform};
use crate::source::SourceImage;
use crate::types::{StoredPath, UploadTarget};
use crate::upload::UploadBlob;
use std::path::Path;

/// Digest characters shown in output.
const SHORT_DIGEST: usize = 12;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size.
fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

fn source_label(source: &SourceImage) -> String {
    format!(
        "{} ({}×{})",
        source.name().unwrap_or("(unnamed)"),
        source.natural().width,
        source.natural().height
    )
}

fn crop_line(crop: &CropRegion) -> String {
    format!(
        "{}Crop: {}×{} at ({}, {})",
        indent(1),
        crop.width.round(),
        crop.height.round(),
        crop.x.round(),
        crop.y.round()
    )
}

// ============================================================================
// crop
// ============================================================================

/// Format the result of a local crop.
pub fn format_crop_output(
    source: &SourceImage,
    crop: &CropRegion,
    transform: &Transform,
    bitmap: &Bitmap,
    destination: &Path,
) -> Vec<String> {
    let mut lines = vec![source_label(source), crop_line(crop)];
    if !transform.is_identity() {
        lines.push(format!("{}Transform: {}", indent(1), transform.to_css()));
    }
    lines.push(format!(
        "{}Output: {}×{} {}, {} \u{2192} {}",
        indent(1),
        bitmap.width,
        bitmap.height,
        bitmap.mime_type,
        format_size(bitmap.bytes.len() as u64),
        destination.display()
    ));
    lines
}

pub fn print_crop_output(
    source: &SourceImage,
    crop: &CropRegion,
    transform: &Transform,
    bitmap: &Bitmap,
    destination: &Path,
) {
    for line in format_crop_output(source, crop, transform, bitmap, destination) {
        println!("{}", line);
    }
}

// ============================================================================
// upload
// ============================================================================

/// Format a completed upload.
pub fn format_upload_output(
    blob: &UploadBlob,
    target: UploadTarget,
    stored: &StoredPath,
) -> Vec<String> {
    let digest: String = blob.digest.chars().take(SHORT_DIGEST).collect();
    vec![
        format!(
            "{} \u{2190} {} ({})",
            target,
            blob.name,
            format_size(blob.size())
        ),
        format!("{}Digest: {}", indent(1), digest),
        format!("{}Stored: {}", indent(1), stored),
    ]
}

pub fn print_upload_output(blob: &UploadBlob, target: UploadTarget, stored: &StoredPath) {
    for line in format_upload_output(blob, target, stored) {
        println!("{}", line);
    }
}

// ============================================================================
// resolve
// ============================================================================

/// Format how a stored path was displayed.
pub fn format_resolve_output(
    path: &StoredPath,
    category: Category,
    rendering: &Rendering,
    stats: &CacheStats,
) -> Vec<String> {
    let shown = if path.is_empty() {
        "(empty)"
    } else {
        path.as_str()
    };
    let head = match rendering {
        Rendering::Image { url, .. } => format!("{} \u{2192} {}", shown, url),
        Rendering::Placeholder { .. } => {
            format!("{} \u{2192} placeholder ({})", shown, category)
        }
    };
    vec![head, format!("{}Cache: {}", indent(1), stats)]
}

pub fn print_resolve_output(
    path: &StoredPath,
    category: Category,
    rendering: &Rendering,
    stats: &CacheStats,
) {
    for line in format_resolve_output(path, category, rendering, stats) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::source::SelectedFile;

    fn source() -> SourceImage {
        SourceImage::from_parts(
            SelectedFile::new(Some("photo.jpg".into()), "image/jpeg", vec![0; 4]),
            Dimensions {
                width: 1024,
                height: 768,
            },
        )
    }

    fn bitmap(bytes: usize) -> Bitmap {
        Bitmap {
            width: 768,
            height: 768,
            mime_type: "image/jpeg".into(),
            bytes: vec![0; bytes],
        }
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn crop_output_without_transform() {
        let lines = format_crop_output(
            &source(),
            &CropRegion::pixels(128.0, 0.0, 768.0, 768.0),
            &Transform::default(),
            &bitmap(2048),
            Path::new("out.jpg"),
        );
        assert_eq!(
            lines,
            vec![
                "photo.jpg (1024×768)",
                "    Crop: 768×768 at (128, 0)",
                "    Output: 768×768 image/jpeg, 2.0 KiB \u{2192} out.jpg",
            ]
        );
    }

    #[test]
    fn crop_output_shows_transform() {
        let lines = format_crop_output(
            &source(),
            &CropRegion::pixels(0.0, 0.0, 10.0, 10.0),
            &Transform::new(1.5, 90),
            &bitmap(10),
            Path::new("out.jpg"),
        );
        assert_eq!(lines[2], "    Transform: scale(1.5) rotate(90deg)");
    }

    #[test]
    fn upload_output_shortens_digest() {
        let blob = UploadBlob::from_bitmap(bitmap(100), Some("photo.jpg"));
        let lines = format_upload_output(
            &blob,
            UploadTarget::News,
            &StoredPath::new("news/abc123.jpg"),
        );
        assert_eq!(lines[0], "news \u{2190} photo.jpg (100 B)");
        assert_eq!(lines[1].len(), "    Digest: ".len() + SHORT_DIGEST);
        assert_eq!(lines[2], "    Stored: news/abc123.jpg");
    }

    #[test]
    fn resolve_output_for_url_and_placeholder() {
        let stats = CacheStats {
            misses: 1,
            ..CacheStats::default()
        };
        let image = Rendering::Image {
            url: "https://cdn/news/a.jpg".into(),
            alt: "News".into(),
        };
        assert_eq!(
            format_resolve_output(&StoredPath::new("news/a.jpg"), Category::News, &image, &stats),
            vec!["news/a.jpg \u{2192} https://cdn/news/a.jpg", "    Cache: 1 resolved"]
        );

        let placeholder = Rendering::Placeholder { svg: String::new() };
        let lines = format_resolve_output(
            &StoredPath::default(),
            Category::Team,
            &placeholder,
            &stats,
        );
        assert_eq!(lines[0], "(empty) \u{2192} placeholder (team)");
    }
}
