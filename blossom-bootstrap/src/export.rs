//! JSON export of historical records from the external source
//!
//! The export groups records by volunteer. Every timestamp is the source's
//! `created_utc` (fractional Unix seconds) and may be missing.

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Author name the source reports for deleted accounts
pub const DELETED_AUTHOR: &str = "[deleted]";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    #[serde(default)]
    pub volunteers: Vec<VolunteerExport>,
}

impl Export {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// One volunteer and their reconstructed history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolunteerExport {
    /// Missing or `[deleted]` for removed accounts
    pub username: Option<String>,
    /// Official completed count kept by the old system
    pub gamma: Option<i64>,
    pub redis_id: Option<String>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl VolunteerExport {
    /// Username if the account still exists on the source
    pub fn live_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != DELETED_AUTHOR)
    }
}

/// One completed post; a record without `post` could not be reconstructed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Record {
    pub post: Option<ExternalPost>,
    /// The volunteer's transcription comment
    pub comment: Option<ExternalComment>,
    pub body: Option<String>,
    pub claim: Option<ExternalComment>,
    pub done: Option<ExternalComment>,
    pub transcribot_comment: Option<ExternalComment>,
    pub transcribot_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalPost {
    pub id: String,
    pub created_utc: Option<f64>,
    pub url: Option<String>,
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalComment {
    pub id: String,
    pub created_utc: Option<f64>,
    pub permalink: Option<String>,
    pub author: Option<String>,
}

impl ExternalComment {
    /// Written by an account that has since been deleted
    pub fn author_deleted(&self) -> bool {
        self.author.as_deref() == Some(DELETED_AUTHOR)
    }
}

/// Absolute URL for a source permalink
pub fn source_url(permalink: Option<&str>) -> Option<String> {
    permalink.map(|p| format!("https://reddit.com{}", p))
}
