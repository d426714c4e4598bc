//! Shared types used across the acquisition, upload, and display stages.
//!
//! A [`StoredPath`] is produced by the upload stage and consumed by the
//! display stage; an [`UploadTarget`] picks both the upload endpoint and the
//! placeholder style.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier returned by the storage collaborator.
///
/// Empty means "no image".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredPath(String);

impl StoredPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoredPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for StoredPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Which upload category a blob belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadTarget {
    Member,
    Event,
    News,
    Game,
    Partner,
}

impl UploadTarget {
    pub const ALL: [UploadTarget; 5] = [
        UploadTarget::Member,
        UploadTarget::Event,
        UploadTarget::News,
        UploadTarget::Game,
        UploadTarget::Partner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Event => "event",
            Self::News => "news",
            Self::Game => "game",
            Self::Partner => "partner",
        }
    }
}

impl fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                format!("unknown upload target '{s}' (expected member, event, news, game or partner)")
            })
    }
}
