//! File intake: what the operator picked, and the decoded source it becomes.
//!
//! A [`SelectedFile`] is whatever a file picker, a drop event, or the disk
//! handed over. It is validated (MIME prefix, size cap) before anything is
//! decoded. A [`SourceImage`] is the validated file plus its natural and
//! displayed dimensions, owned by exactly one crop session.

use crate::acquire::AcquisitionError;
use crate::imaging::{BackendError, Dimensions, ImageBackend, get_dimensions};
use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

/// Largest accepted upload source: 5 MiB.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// A file as handed over by a picker or drop event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: Option<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reject anything that is not `image/*` or is larger than `max_size`.
    pub fn validate(&self, max_size: u64) -> Result<(), AcquisitionError> {
        if !self.mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(AcquisitionError::InvalidFile(format!(
                "please choose an image file (got {})",
                if self.mime_type.is_empty() {
                    "an unknown type"
                } else {
                    self.mime_type.as_str()
                }
            )));
        }
        if self.size() > max_size {
            return Err(AcquisitionError::FileTooLarge {
                size: self.size(),
                max: max_size,
            });
        }
        Ok(())
    }
}

/// A validated, identified source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    name: Option<String>,
    mime_type: String,
    bytes: Vec<u8>,
    natural: Dimensions,
    display: Dimensions,
}

impl SourceImage {
    /// Identify a selected file. The displayed size starts at natural size.
    pub fn load(file: SelectedFile, backend: &impl ImageBackend) -> Result<Self, BackendError> {
        let natural = get_dimensions(backend, &file.bytes)?;
        Ok(Self::from_parts(file, natural))
    }

    pub fn from_parts(file: SelectedFile, natural: Dimensions) -> Self {
        Self {
            name: file.name,
            mime_type: file.mime_type,
            bytes: file.bytes,
            natural,
            display: natural,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn natural(&self) -> Dimensions {
        self.natural
    }

    /// Layout size of the preview element.
    pub fn display(&self) -> Dimensions {
        self.display
    }

    pub fn set_display(&mut self, display: Dimensions) {
        self.display = display;
    }

    /// `data:` URL for the preview element.
    pub fn preview_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
