//! Source metadata models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an upstream source (the 11-character video id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Descriptive metadata for one source, fetched without downloading media.
///
/// Every field except the identifier is optional: upstream metadata is
/// frequently incomplete and nothing downstream requires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source_id: SourceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Total duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Canonical URL of the source.
    pub url: String,
}

impl SourceMetadata {
    /// Metadata carrying only the identifier and URL.
    pub fn bare(source_id: impl Into<SourceId>, url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            title: None,
            description: None,
            duration_secs: None,
            uploader: None,
            upload_date: None,
            thumbnail: None,
            url: url.into(),
        }
    }

    /// Title, or the identifier when no title is known.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.source_id.as_str())
    }
}

/// Parse an upstream `YYYYMMDD` date string.
pub fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").ok()
}
