//! Shared test utilities for the picture-intake test suite.
//!
//! Provides synthetic image bytes, ready-made sources for crop tests, a
//! recording uploader, and a display resolver with a predictable rule.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = source_image(1024, 768);
//! let uploader = RecordingUploader::returning("news/abc123.jpg");
//! // ... drive an Acquisition ...
//! assert_eq!(uploader.call_count(), 1);
//! ```

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use image::{ImageFormat, Rgb, RgbImage};

use crate::display::{BaseUrlRule, DisplayResolver, MemoryUrlCache};
use crate::imaging::Dimensions;
use crate::source::{SelectedFile, SourceImage};
use crate::types::{StoredPath, UploadTarget};
use crate::upload::{UploadBlob, UploadError, Uploader};

// =========================================================================
// Synthetic images
// =========================================================================

/// Gradient so crops of different regions encode differently.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// An encoded JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}

/// An encoded PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

/// A source image with the given natural (and displayed) size. The bytes
/// are not a real image; use with `MockBackend`.
pub fn source_image(width: u32, height: u32) -> SourceImage {
    SourceImage::from_parts(
        SelectedFile::new(Some("photo.jpg".into()), "image/jpeg", vec![0xFF, 0xD8]),
        Dimensions { width, height },
    )
}

// =========================================================================
// Upload
// =========================================================================

/// Uploader that records every call and answers from a script.
///
/// When the script runs out, the last scripted path is returned again.
pub struct RecordingUploader {
    responses: Mutex<VecDeque<Result<StoredPath, UploadError>>>,
    fallback: StoredPath,
    calls: Mutex<Vec<(UploadBlob, UploadTarget)>>,
}

impl RecordingUploader {
    /// Always succeeds with `path`.
    pub fn returning(path: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: StoredPath::new(path),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails with a transport error once, then succeeds with `path`.
    pub fn failing_then(path: &str) -> Self {
        let uploader = Self::returning(path);
        uploader
            .responses
            .lock()
            .unwrap()
            .push_back(Err(UploadError::Transport("connection reset".into())));
        uploader
    }

    pub fn calls(&self) -> Vec<(UploadBlob, UploadTarget)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Uploader for RecordingUploader {
    async fn upload(
        &self,
        blob: &UploadBlob,
        target: UploadTarget,
    ) -> Result<StoredPath, UploadError> {
        self.calls.lock().unwrap().push((blob.clone(), target));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

// =========================================================================
// Display
// =========================================================================

/// Resolver over a fresh cache, joining paths onto `https://cdn.test`.
pub fn resolver() -> DisplayResolver<MemoryUrlCache> {
    DisplayResolver::new(MemoryUrlCache::new(), BaseUrlRule::new("https://cdn.test"))
        .with_sentinels(vec!["placeholder://".into()])
}
