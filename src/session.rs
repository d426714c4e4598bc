//! Crop Session Controller: interactive state for one open image editor.
//!
//! A session owns the [`SourceImage`] being edited, the *live* crop (updated
//! on every drag event, cheap, used for the on-screen overlay), the
//! *committed* crop (set when the pointer is released, used for the final
//! raster), and the preview-only [`Transform`].
//!
//! ```text
//! load ──▶ auto-centre (aspect configured) ──▶ committed
//!   │
//!   └──▶ drag … drag ──▶ release ──▶ committed ──▶ finalize ──▶ Bitmap
//! ```
//!
//! Crops are stored in pixel units of the displayed image and always lie
//! inside it.

use crate::imaging::{
    AspectRatio, BackendError, Bitmap, CropRegion, Dimensions, ImageBackend, RenderOptions,
    Transform, centered_aspect_crop, clamp_crop, render,
};
use crate::source::SourceImage;

/// Share of the displayed width the auto-centred crop starts from.
pub const DEFAULT_COVERAGE: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct CropSession {
    source: SourceImage,
    aspect: Option<AspectRatio>,
    coverage: f64,
    crop: Option<CropRegion>,
    completed: Option<CropRegion>,
    transform: Transform,
    interacting: bool,
}

impl CropSession {
    /// Open a session on a loaded image.
    pub fn new(source: SourceImage, aspect: Option<AspectRatio>, coverage: f64) -> Self {
        let mut session = Self {
            source,
            aspect,
            coverage: coverage.clamp(0.01, 1.0),
            crop: None,
            completed: None,
            transform: Transform::default(),
            interacting: false,
        };
        session.on_image_loaded();
        session
    }

    /// Image finished loading: auto-centre and commit a crop when an aspect
    /// ratio is configured, otherwise wait for the user to drag.
    pub fn on_image_loaded(&mut self) {
        match self.aspect {
            Some(aspect) => {
                let crop = centered_aspect_crop(self.source.display(), aspect.value(), self.coverage);
                tracing::debug!(?crop, "Auto-centred crop");
                self.crop = Some(crop);
                self.completed = Some(crop);
            }
            None => {
                self.crop = None;
                self.completed = None;
            }
        }
        self.interacting = false;
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn aspect(&self) -> Option<AspectRatio> {
        self.aspect
    }

    /// Crop shown under the pointer while dragging.
    pub fn live_crop(&self) -> Option<CropRegion> {
        self.crop
    }

    /// Crop committed on the last interaction end.
    pub fn completed_crop(&self) -> Option<CropRegion> {
        self.completed
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    /// Pointer moved: update the live crop only. Non-finite coordinates
    /// are ignored.
    pub fn drag(&mut self, crop: CropRegion) {
        if !crop.is_finite() {
            tracing::debug!(?crop, "Ignoring non-finite crop");
            return;
        }
        self.interacting = true;
        self.crop = Some(self.constrain(crop));
    }

    /// Pointer released: commit the live crop. A crop without area clears the
    /// commitment, so a stray click cannot export an empty raster.
    pub fn release(&mut self) {
        self.interacting = false;
        self.completed = self.crop.filter(CropRegion::has_area);
        tracing::debug!(completed = ?self.completed, "Crop committed");
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.transform = Transform::new(scale, self.transform.rotate_degrees());
    }

    pub fn set_rotation(&mut self, degrees: i32) {
        self.transform = Transform::new(self.transform.scale(), degrees);
    }

    /// CSS transform for the preview element.
    pub fn preview_css(&self) -> String {
        self.transform.to_css()
    }

    /// The preview element was laid out at a new size.
    pub fn set_display_size(&mut self, display: Dimensions) {
        if display == self.source.display() {
            return;
        }
        self.source.set_display(display);
        if self.aspect.is_some() {
            self.on_image_loaded();
        } else {
            self.crop = self.crop.map(|c| clamp_crop(&c, display));
            self.completed = self.completed.map(|c| clamp_crop(&c, display));
        }
    }

    /// Change the aspect constraint; the crop is re-centred under the new one.
    pub fn set_aspect(&mut self, aspect: Option<AspectRatio>) {
        if aspect == self.aspect {
            return;
        }
        self.aspect = aspect;
        if aspect.is_some() {
            self.on_image_loaded();
        }
    }

    /// Render the committed crop.
    ///
    /// Returns `Ok(None)` without touching the backend when nothing has been
    /// committed yet; the caller should prompt for a selection.
    pub fn finalize(
        &self,
        backend: &impl ImageBackend,
        options: &RenderOptions,
    ) -> Result<Option<Bitmap>, BackendError> {
        let Some(crop) = self.completed else {
            tracing::debug!("Finalize without a committed crop, ignoring");
            return Ok(None);
        };
        render(backend, &self.source, &crop, &self.transform, options).map(Some)
    }

    /// Discard the session and everything it owns.
    pub fn cancel(self) {
        tracing::debug!(file = ?self.source.name(), "Crop session cancelled");
    }

    fn constrain(&self, crop: CropRegion) -> CropRegion {
        let display = self.source.display();
        let clamped = clamp_crop(&crop.to_pixels(display), display);
        match self.aspect {
            Some(aspect) => {
                let ratio = aspect.value();
                let mut width = clamped.width;
                let mut height = width / ratio;
                let room = display.height as f64 - clamped.y;
                if height > room {
                    height = room;
                    width = height * ratio;
                }
                CropRegion::pixels(clamped.x, clamped.y, width, height)
            }
            None => clamped,
        }
    }
}
