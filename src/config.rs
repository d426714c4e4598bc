//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `pipeline.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [upload]
//! base_url = "http://localhost:8080/api"   # Upload collaborator root
//! max_file_size = 5242880                  # Largest accepted source file (bytes)
//! timeout_secs = 30                        # Per-request timeout
//!
//! [upload.endpoints]
//! member = "upload/member"
//! event = "upload/event"
//! news = "upload/news"
//! game = "upload/game"
//! partner = "upload/partner"
//!
//! [crop]
//! coverage = 0.9                 # Share of the width the auto-centred crop starts at
//! quality = 90                   # JPEG quality (1-100)
//! bake_preview_transform = false # Bake preview scale/rotation into the export
//! # aspect_ratio = [1, 1]        # width:height constraint
//! # output_size = [512, 512]     # Fixed export size in pixels
//!
//! [display]
//! asset_base_url = "http://localhost:8080/static"
//! sentinels = ["placeholder://", "test-image", "default-image"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{AspectRatio, Dimensions, Quality, RenderOptions};
use crate::types::UploadTarget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "pipeline.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `pipeline.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Upload collaborator location and limits.
    pub upload: UploadConfig,
    /// Crop and export settings.
    pub crop: CropConfig,
    /// Stored-path display settings.
    pub display: DisplayConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upload.base_url must not be empty".into(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "upload.max_file_size must be positive".into(),
            ));
        }
        if self.upload.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "upload.timeout_secs must be positive".into(),
            ));
        }
        for target in UploadTarget::ALL {
            if self.upload.endpoints.get(target).trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "upload.endpoints.{target} must not be empty"
                )));
            }
        }
        if !(self.crop.coverage > 0.0 && self.crop.coverage <= 1.0) {
            return Err(ConfigError::Validation(
                "crop.coverage must be in (0, 1]".into(),
            ));
        }
        if self.crop.quality == 0 || self.crop.quality > 100 {
            return Err(ConfigError::Validation("crop.quality must be 1-100".into()));
        }
        if let Some([w, h]) = self.crop.aspect_ratio
            && (w == 0 || h == 0)
        {
            return Err(ConfigError::Validation(
                "crop.aspect_ratio values must be non-zero".into(),
            ));
        }
        if let Some([w, h]) = self.crop.output_size
            && (w == 0 || h == 0)
        {
            return Err(ConfigError::Validation(
                "crop.output_size values must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub base_url: String,
    pub max_file_size: u64,
    pub timeout_secs: u64,
    pub endpoints: UploadEndpoints,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            max_file_size: crate::source::MAX_FILE_SIZE,
            timeout_secs: 30,
            endpoints: UploadEndpoints::default(),
        }
    }
}

/// Endpoint per upload target, relative to `upload.base_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadEndpoints {
    pub member: String,
    pub event: String,
    pub news: String,
    pub game: String,
    pub partner: String,
}

impl Default for UploadEndpoints {
    fn default() -> Self {
        let endpoint = |t: UploadTarget| format!("upload/{t}");
        Self {
            member: endpoint(UploadTarget::Member),
            event: endpoint(UploadTarget::Event),
            news: endpoint(UploadTarget::News),
            game: endpoint(UploadTarget::Game),
            partner: endpoint(UploadTarget::Partner),
        }
    }
}

impl UploadEndpoints {
    pub fn get(&self, target: UploadTarget) -> &str {
        match target {
            UploadTarget::Member => &self.member,
            UploadTarget::Event => &self.event,
            UploadTarget::News => &self.news,
            UploadTarget::Game => &self.game,
            UploadTarget::Partner => &self.partner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub coverage: f64,
    pub quality: u32,
    pub bake_preview_transform: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<[u32; 2]>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            coverage: crate::session::DEFAULT_COVERAGE,
            quality: Quality::default().value(),
            bake_preview_transform: false,
            aspect_ratio: None,
            output_size: None,
        }
    }
}

impl CropConfig {
    pub fn aspect(&self) -> Option<AspectRatio> {
        self.aspect_ratio.and_then(|[w, h]| AspectRatio::new(w, h))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            output_size: self
                .output_size
                .map(|[width, height]| Dimensions { width, height }),
            quality: Quality::new(self.quality),
            bake_preview_transform: self.bake_preview_transform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Root that relative stored paths are joined onto.
    pub asset_base_url: String,
    /// Reserved stored paths that render the placeholder. Entries ending in
    /// `://` match as a prefix, the rest match exactly.
    pub sentinels: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            asset_base_url: "http://localhost:8080/static".to_string(),
            sentinels: vec![
                "placeholder://".to_string(),
                "test-image".to_string(),
                "default-image".to_string(),
            ],
        }
    }
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "picture_intake=info"
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Returns a fully-commented stock `pipeline.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Picture Intake Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Upload collaborator
# ---------------------------------------------------------------------------
[upload]
# Root URL of the upload API. Endpoints below are joined onto it.
base_url = "http://localhost:8080/api"

# Largest accepted source file in bytes (5 MiB).
max_file_size = 5242880

# Per-request timeout in seconds. There are no automatic retries.
timeout_secs = 30

# Endpoint per upload target. The server answers {"path": "..."}.
[upload.endpoints]
member = "upload/member"
event = "upload/event"
news = "upload/news"
game = "upload/game"
partner = "upload/partner"

# ---------------------------------------------------------------------------
# Crop and export
# ---------------------------------------------------------------------------
[crop]
# Share of the displayed width the auto-centred crop starts from.
coverage = 0.9

# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# Bake the preview scale and rotation into the exported image.
# When false, only the crop rectangle is exported.
bake_preview_transform = false

# Aspect ratio as [width, height]. Omit for a free-form crop.
# aspect_ratio = [1, 1]

# Fixed export size in pixels. Omit to export at crop size.
# output_size = [512, 512]

# ---------------------------------------------------------------------------
# Display
# ---------------------------------------------------------------------------
[display]
# Root URL relative stored paths are joined onto.
asset_base_url = "http://localhost:8080/static"

# Reserved stored paths that show the category placeholder. Entries ending
# in "://" reserve the whole scheme; the others must match exactly.
sentinels = ["placeholder://", "test-image", "default-image"]
"##
}
