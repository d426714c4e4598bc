//! Acquisition Orchestrator: from a picked file to a stored path.
//!
//! One [`Acquisition`] drives at most one [`CropSession`] at a time and walks
//! it through the session states:
//!
//! ```text
//! Idle ─select─▶ FileSelected ─decode─▶ Previewing ─▶ Cropping ─finalize─▶ Uploading ─▶ Done ─▶ Idle
//!  ▲                  │                                  ▲                      │
//!  │                  └──decode failed──▶ Error          └────upload failed─────┘
//!  └──────────────────────────── cancel (from anywhere) ───────────────────────────────
//! ```
//!
//! Uploading is split in three steps so a caller can let the network call
//! run without holding the orchestrator: [`Acquisition::begin_upload`] hands
//! out a [`PendingUpload`], [`PendingUpload::send`] performs the call, and
//! [`Acquisition::complete`] applies the [`UploadReceipt`]. Every receipt
//! carries the ticket of the session it was issued for; receipts from a
//! cancelled or replaced session are dropped. Calling `begin_upload` again
//! while `Uploading` abandons the earlier [`PendingUpload`] and issues a new
//! one for the same blob.
//!
//! After an upload failure the rendered blob is kept, the state returns to
//! `Cropping`, and [`Acquisition::retry_upload`] sends the same bytes again.

use crate::config::PipelineConfig;
use crate::display::{Category, DisplayError, ImageView};
use crate::imaging::{
    AspectRatio, BackendError, CropRegion, ImageBackend, RenderOptions, Transform,
};
use crate::session::{CropSession, DEFAULT_COVERAGE};
use crate::source::{MAX_FILE_SIZE, SelectedFile, SourceImage};
use crate::types::{StoredPath, UploadTarget};
use crate::upload::{UploadBlob, UploadError, Uploader};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Invalid file: {0}")]
    InvalidFile(String),
    #[error("File is too large ({size} bytes, limit is {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
    #[error("Could not render image: {0}")]
    Render(#[from] BackendError),
    #[error("Upload failed: {0}")]
    UploadFailed(#[from] UploadError),
    #[error("No image is being edited")]
    NoActiveSession,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FileSelected,
    Previewing,
    Cropping,
    Uploading,
    Done,
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FileSelected => "file-selected",
            Self::Previewing => "previewing",
            Self::Cropping => "cropping",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Caller-facing knobs of one acquisition widget.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionOptions {
    pub target: UploadTarget,
    pub aspect_ratio: Option<AspectRatio>,
    /// Label shown on the placeholder while no image is set.
    pub placeholder_text: Option<String>,
    /// Already stored image, for edit flows.
    pub existing_image: Option<StoredPath>,
    pub max_file_size: u64,
    pub coverage: f64,
    pub render: RenderOptions,
}

impl AcquisitionOptions {
    pub fn new(target: UploadTarget) -> Self {
        Self {
            target,
            aspect_ratio: None,
            placeholder_text: None,
            existing_image: None,
            max_file_size: MAX_FILE_SIZE,
            coverage: DEFAULT_COVERAGE,
            render: RenderOptions::default(),
        }
    }

    /// Options for `target` with limits and render settings from config.
    pub fn from_config(config: &PipelineConfig, target: UploadTarget) -> Self {
        Self {
            aspect_ratio: config.crop.aspect(),
            max_file_size: config.upload.max_file_size,
            coverage: config.crop.coverage,
            render: config.crop.render_options(),
            ..Self::new(target)
        }
    }

    pub fn with_aspect_ratio(mut self, aspect: Option<AspectRatio>) -> Self {
        self.aspect_ratio = aspect;
        self
    }

    pub fn with_existing_image(mut self, path: StoredPath) -> Self {
        self.existing_image = (!path.is_empty()).then_some(path);
        self
    }

    pub fn with_placeholder_text(mut self, text: impl Into<String>) -> Self {
        self.placeholder_text = Some(text.into());
        self
    }
}

/// Called once per successful acquisition with the stored path.
pub type UploadCallback = Box<dyn FnMut(&StoredPath)>;

/// A rendered blob waiting to be sent, tagged with its session ticket.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    ticket: u64,
    blob: UploadBlob,
    target: UploadTarget,
}

impl PendingUpload {
    pub fn blob(&self) -> &UploadBlob {
        &self.blob
    }

    pub fn target(&self) -> UploadTarget {
        self.target
    }

    /// Perform the network call. Never touches the orchestrator.
    pub async fn send(self, uploader: &impl Uploader) -> UploadReceipt {
        let result = uploader.upload(&self.blob, self.target).await;
        UploadReceipt {
            ticket: self.ticket,
            result,
        }
    }
}

/// Outcome of [`PendingUpload::send`], to be handed to [`Acquisition::complete`].
#[derive(Debug)]
pub struct UploadReceipt {
    ticket: u64,
    result: Result<StoredPath, UploadError>,
}

/// Blob kept after a failed upload, with the crop it was rendered from.
#[derive(Debug, Clone)]
struct RetainedBlob {
    crop: CropRegion,
    transform: Transform,
    blob: UploadBlob,
}

pub struct Acquisition<B: ImageBackend> {
    backend: B,
    options: AcquisitionOptions,
    state: SessionState,
    session: Option<CropSession>,
    retained: Option<RetainedBlob>,
    ticket: u64,
    last_error: Option<String>,
    current_image: Option<StoredPath>,
    view: ImageView,
    on_image_upload: Option<UploadCallback>,
}

impl<B: ImageBackend> Acquisition<B> {
    pub fn new(backend: B, options: AcquisitionOptions) -> Self {
        let current_image = options.existing_image.clone();
        let mut view = ImageView::new(Category::from(options.target))
            .with_label(options.placeholder_text.clone());
        if let Some(path) = &current_image {
            view.set_path(path.clone());
        }
        Self {
            backend,
            options,
            state: SessionState::Idle,
            session: None,
            retained: None,
            ticket: 0,
            last_error: None,
            current_image,
            view,
            on_image_upload: None,
        }
    }

    /// Register the completion callback.
    pub fn with_callback(mut self, callback: impl FnMut(&StoredPath) + 'static) -> Self {
        self.on_image_upload = Some(Box::new(callback));
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &AcquisitionOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Message of the most recent failure, for inline display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Latest stored path: the seed image or the last successful upload.
    pub fn current_image(&self) -> Option<&StoredPath> {
        self.current_image.as_ref()
    }

    pub fn session(&self) -> Option<&CropSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut CropSession> {
        self.session.as_mut()
    }

    /// `data:` URL of the image being edited.
    pub fn preview(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.source().preview_data_url())
    }

    /// Display component for the current image, falling back to the
    /// target's placeholder. It lives as long as the orchestrator, so load
    /// failures reported through [`Acquisition::on_display_error`] stick.
    pub fn image_view(&self) -> &ImageView {
        &self.view
    }

    /// The current image failed to load in the host's display.
    pub fn on_display_error(&mut self, error: DisplayError) {
        self.view.on_error(error);
    }

    /// Start a new acquisition from a picked file. Any session in progress
    /// is dropped first.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), AcquisitionError> {
        self.discard_session();

        if let Err(e) = file.validate(self.options.max_file_size) {
            tracing::warn!(name = ?file.name, mime = %file.mime_type, size = file.size(), "Rejected file: {}", e);
            self.last_error = Some(e.to_string());
            self.state = SessionState::Idle;
            return Err(e);
        }

        self.last_error = None;
        self.transition(SessionState::FileSelected);

        let source = match SourceImage::load(file, &self.backend) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Could not decode selected file: {}", e);
                self.last_error = Some(e.to_string());
                self.transition(SessionState::Error);
                return Err(e.into());
            }
        };

        self.transition(SessionState::Previewing);
        tracing::info!(
            name = ?source.name(),
            width = source.natural().width,
            height = source.natural().height,
            "Image loaded"
        );
        self.session = Some(CropSession::new(
            source,
            self.options.aspect_ratio,
            self.options.coverage,
        ));
        self.transition(SessionState::Cropping);
        Ok(())
    }

    /// Files dropped on the widget; only the first one is used.
    pub fn drop_files(
        &mut self,
        files: impl IntoIterator<Item = SelectedFile>,
    ) -> Result<(), AcquisitionError> {
        match files.into_iter().next() {
            Some(file) => self.select_file(file),
            None => Ok(()),
        }
    }

    /// Read a file from disk and select it.
    pub async fn select_path(&mut self, path: &Path) -> Result<(), AcquisitionError> {
        let file = match SelectedFile::from_path(path).await {
            Ok(file) => file,
            Err(e) => {
                self.last_error = Some(format!("{}: {}", path.display(), e));
                return Err(e.into());
            }
        };
        self.select_file(file)
    }

    /// Render the committed crop (or reuse the blob kept from a failed
    /// upload of the same crop) and move to `Uploading`.
    ///
    /// Returns `Ok(None)` when no crop has been committed yet.
    pub fn begin_upload(&mut self) -> Result<Option<PendingUpload>, AcquisitionError> {
        match self.state {
            SessionState::Cropping => {}
            SessionState::Uploading => {
                // The earlier PendingUpload is abandoned; its receipt goes stale.
                tracing::warn!(ticket = self.ticket, "Re-issuing upload in progress");
                self.ticket += 1;
                self.transition(SessionState::Cropping);
            }
            _ => return Err(AcquisitionError::NoActiveSession),
        }
        let Some(session) = self.session.as_ref() else {
            return Err(AcquisitionError::NoActiveSession);
        };
        let Some(crop) = session.completed_crop() else {
            self.last_error = Some("Select an area to crop first".to_string());
            return Ok(None);
        };
        let transform = session.transform();

        let blob = match self
            .retained
            .take()
            .filter(|r| r.crop == crop && r.transform == transform)
        {
            Some(retained) => {
                tracing::debug!(digest = %retained.blob.digest, "Reusing rendered blob");
                retained.blob
            }
            None => match session.finalize(&self.backend, &self.options.render) {
                Ok(Some(bitmap)) => UploadBlob::from_bitmap(bitmap, session.source().name()),
                Ok(None) => return Ok(None),
                Err(e) => {
                    tracing::warn!("Render failed: {}", e);
                    self.last_error = Some(e.to_string());
                    return Err(e.into());
                }
            },
        };

        self.retained = Some(RetainedBlob {
            crop,
            transform,
            blob: blob.clone(),
        });
        self.last_error = None;
        self.transition(SessionState::Uploading);
        Ok(Some(PendingUpload {
            ticket: self.ticket,
            blob,
            target: self.options.target,
        }))
    }

    /// Apply an upload result.
    ///
    /// Returns `Ok(None)` when the receipt belongs to a session that no
    /// longer exists; nothing changes in that case.
    pub fn complete(
        &mut self,
        receipt: UploadReceipt,
    ) -> Result<Option<StoredPath>, AcquisitionError> {
        if receipt.ticket != self.ticket || self.state != SessionState::Uploading {
            tracing::warn!(
                ticket = receipt.ticket,
                current = self.ticket,
                "Discarding stale upload result"
            );
            return Ok(None);
        }

        match receipt.result {
            Ok(path) => {
                self.transition(SessionState::Done);
                tracing::info!(%path, target = %self.options.target, "Image stored");
                self.current_image = Some(path.clone());
                self.view.set_path(path.clone());
                if let Some(callback) = self.on_image_upload.as_mut() {
                    callback(&path);
                }
                self.discard_session();
                Ok(Some(path))
            }
            Err(e) => {
                tracing::warn!("Upload failed: {}", e);
                self.last_error = Some(e.to_string());
                self.transition(SessionState::Cropping);
                Err(e.into())
            }
        }
    }

    /// Render, upload and complete in one go.
    pub async fn finalize(
        &mut self,
        uploader: &impl Uploader,
    ) -> Result<Option<StoredPath>, AcquisitionError> {
        let Some(pending) = self.begin_upload()? else {
            return Ok(None);
        };
        let receipt = pending.send(uploader).await;
        self.complete(receipt)
    }

    /// Send the blob kept from the last failed upload again.
    pub async fn retry_upload(
        &mut self,
        uploader: &impl Uploader,
    ) -> Result<Option<StoredPath>, AcquisitionError> {
        if self.retained.is_none() {
            return Err(AcquisitionError::NoActiveSession);
        }
        self.finalize(uploader).await
    }

    /// Drop the session and return to `Idle`. Always succeeds; an upload
    /// already in flight completes but its receipt is ignored.
    pub fn cancel(&mut self) {
        if self.state != SessionState::Idle {
            tracing::info!(from = %self.state, "Acquisition cancelled");
        }
        self.discard_session();
        self.last_error = None;
    }

    fn discard_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        self.retained = None;
        self.ticket += 1;
        self.state = SessionState::Idle;
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "State change");
        self.state = next;
    }
}
