//! Upload Resolver: hand a finished blob to the storage collaborator.
//!
//! One call, one answer. There is no retry and no backoff here; a failed
//! request fails the acquisition attempt and the error travels back to the
//! orchestrator verbatim. Uploaders never inspect or alter blob bytes.
//!
//! [`HttpUploader`] speaks the collaborator's protocol: a multipart `POST`
//! of the blob (part name `image`) to the target's endpoint, answered with
//! `{"path": "..."}`.

use crate::config::UploadConfig;
use crate::imaging::Bitmap;
use crate::types::{StoredPath, UploadTarget};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// File name used when the source file had none.
pub const GENERIC_BLOB_NAME: &str = "cropped-image.jpg";

/// Header carrying the blob's SHA-256, so the server can verify integrity.
pub const DIGEST_HEADER: &str = "x-content-sha256";

/// Longest server error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Server rejected the upload ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected upload response: {0}")]
    MalformedResponse(String),
    #[error("Server returned an empty path")]
    EmptyPath,
}

/// A rendered image ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBlob {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`, hex encoded.
    pub digest: String,
}

impl UploadBlob {
    /// Wrap a bitmap, reusing the original file name when there is one.
    pub fn from_bitmap(bitmap: Bitmap, original_name: Option<&str>) -> Self {
        let name = original_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(GENERIC_BLOB_NAME)
            .to_string();
        let digest = format!("{:x}", Sha256::digest(&bitmap.bytes));
        Self {
            name,
            mime_type: bitmap.mime_type,
            bytes: bitmap.bytes,
            digest,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The storage collaborator, seen from the pipeline.
pub trait Uploader {
    fn upload(
        &self,
        blob: &UploadBlob,
        target: UploadTarget,
    ) -> impl Future<Output = Result<StoredPath, UploadError>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    path: String,
}

/// Parse the collaborator's `{"path": "..."}` answer.
pub fn parse_upload_response(body: &str) -> Result<StoredPath, UploadError> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
    let path = StoredPath::new(response.path);
    if path.is_empty() {
        return Err(UploadError::EmptyPath);
    }
    Ok(path)
}

/// Join a base URL and a relative endpoint with exactly one slash.
fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn truncate(message: &str) -> String {
    let trimmed = message.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Uploads over HTTP with `reqwest`.
pub struct HttpUploader {
    client: reqwest::Client,
    config: UploadConfig,
}

impl HttpUploader {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Absolute URL the blob for `target` is posted to.
    pub fn endpoint_url(&self, target: UploadTarget) -> String {
        join_url(&self.config.base_url, self.config.endpoints.get(target))
    }
}

impl Uploader for HttpUploader {
    async fn upload(
        &self,
        blob: &UploadBlob,
        target: UploadTarget,
    ) -> Result<StoredPath, UploadError> {
        let url = self.endpoint_url(target);
        tracing::info!(%url, name = %blob.name, size = blob.size(), digest = %blob.digest, "Uploading image");

        let part = Part::bytes(blob.bytes.clone())
            .file_name(blob.name.clone())
            .mime_str(&blob.mime_type)
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let form = Form::new().text("type", target.as_str()).part("image", part);

        let response = self
            .client
            .post(&url)
            .header(DIGEST_HEADER, &blob.digest)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                message: truncate(&body),
            });
        }

        parse_upload_response(&body)
    }
}
