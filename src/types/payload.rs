use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// The only event type this pipeline ingests.
pub const EVENT_REPO_UPDATED: &str = "repo_updated";

/// Outer webhook envelope as POSTed by the upstream crawler.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub event_type: String,
    pub timestamp: String,
    pub data: RepositoryPayload,
}

impl WebhookEnvelope {
    /// Parses and schema-validates a raw request body. Pure: performs no side
    /// effects on failure, and the error carries serde's field-level detail.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::Validation(e.to_string()))
    }

    /// Event-type check, applied only after schema validation succeeds.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.event_type != EVENT_REPO_UPDATED {
            return Err(Error::UnsupportedEvent(self.event_type.clone()));
        }
        Ok(())
    }
}

/// Repository state as reported by the crawler.
///
/// Identity and lifecycle timestamps are required; everything else is
/// optional and nullable.
#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub id: String,
    pub full_name: String,
    pub name: String,
    pub owner: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub localized_description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub stars: Option<i64>,
    #[serde(default)]
    pub forks: Option<i64>,
    #[serde(default)]
    pub watchers: Option<i64>,
    #[serde(default)]
    pub contributors: Option<i64>,
    #[serde(default)]
    pub pull_requests: Option<i64>,
    #[serde(default)]
    pub releases: Option<i64>,
    #[serde(default)]
    pub commits: Option<i64>,
    #[serde(default)]
    pub readme: Option<String>,
    #[serde(default)]
    pub localized_readme: Option<String>,
    #[serde(default)]
    pub latest_release: Option<ReleaseInfo>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub og_image_url: Option<String>,
    #[serde(default)]
    pub og_image_oss_url: Option<String>,
    #[serde(default)]
    pub last_commit_at: Option<DateTime<Utc>>,
    pub processing_status: ProcessingStatus,
    pub meta: PayloadMeta,
}

impl RepositoryPayload {
    /// Reduces the crawler's language structure to a flat list of names.
    #[must_use]
    pub fn language_names(&self) -> Vec<String> {
        self.languages
            .iter()
            .map(|entry| match entry {
                LanguageEntry::Name(name) => name.clone(),
                LanguageEntry::Detailed { name } => name.clone(),
            })
            .collect()
    }
}

/// Languages arrive either as bare strings or as objects carrying a `name`
/// plus crawler-specific extras.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LanguageEntry {
    Name(String),
    Detailed { name: String },
}

#[derive(Debug, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Which enrichment steps the crawler completed before delivery.
/// Validated for shape; not persisted.
#[derive(Debug, Deserialize)]
pub struct ProcessingStatus {
    #[serde(default)]
    pub icon_processed: bool,
    #[serde(default)]
    pub description_translated: bool,
    #[serde(default)]
    pub readme_translated: bool,
    #[serde(default)]
    pub og_image_processed: bool,
    #[serde(default)]
    pub release_note_translated: bool,
}

/// Crawler task bookkeeping attached to every delivery.
#[derive(Debug, Deserialize)]
pub struct PayloadMeta {
    pub task_name: String,
    pub processed_at: DateTime<Utc>,
    pub processing_time_ms: i64,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}
