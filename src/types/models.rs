use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical record mirroring one upstream source-code repository.
///
/// Keyed by the upstream's stable external id; `full_name` (`owner/name`)
/// serves as a secondary lookup key. Rows are created on the first webhook
/// referencing an unseen id and updated in place on every subsequent
/// delivery; this pipeline never deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub full_name: String,
    pub name: String,
    pub owner: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub topics: Vec<String>,
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    pub archived: bool,
    // Metrics stay `None` when the upstream crawler did not report them,
    // so a missing count is distinguishable from an observed zero.
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub watchers: Option<i64>,
    pub contributors: Option<i64>,
    pub pull_requests: Option<i64>,
    pub releases: Option<i64>,
    pub commits: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_release_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_release_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_release_published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_release_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_release_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image_url: Option<String>,
    /// Processed/cached variant of `og_image_url`, preferred when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image_oss_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Instantaneous repository metrics carried by every snapshot row.
///
/// Unlike [`Repository`], absent payload metrics default to zero here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub stars: i64,
    pub forks: i64,
    pub watchers: i64,
    pub contributors: i64,
    pub pull_requests: i64,
    pub releases: i64,
    pub commits: i64,
}

/// Immutable point-in-time measurement, appended on every delivery.
///
/// There is deliberately no uniqueness on (repo, year, month, day): multiple
/// deliveries on the same calendar day produce multiple rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub id: i64,
    pub repo_id: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(flatten)]
    pub metrics: SnapshotMetrics,
    pub created_at: DateTime<Utc>,
}

/// Rolling aggregate, at most one row per (repo, year, month).
/// Each delivery within the period overwrites the stored metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub id: i64,
    pub repo_id: String,
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub metrics: SnapshotMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rolling aggregate, at most one row per (repo, year, week).
/// The week number is this pipeline's own day-of-year formula, not ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    pub id: i64,
    pub repo_id: String,
    pub year: i32,
    pub week: u32,
    #[serde(flatten)]
    pub metrics: SnapshotMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Taxonomy entry, globally unique by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Where the tag came from; tags created by this pipeline use
    /// [`TAG_SOURCE_GITHUB_TOPIC`].
    pub source: String,
    pub tag_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const TAG_SOURCE_GITHUB_TOPIC: &str = "github_topic";
pub const TAG_TYPE_TOPIC: &str = "topic";

/// Review state of a catalog app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            other => {
                tracing::error!("Unknown app status in database: '{}'", other);
                Self::Pending
            }
        }
    }
}

/// Whether an app is visible on the public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Offline,
    Online,
}

impl PublishStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "offline" => Self::Offline,
            "online" => Self::Online,
            other => {
                tracing::error!("Unknown publish status in database: '{}'", other);
                Self::Offline
            }
        }
    }
}

/// How an app record entered the catalog.
pub const APP_SOURCE_WEBHOOK: &str = "webhook";
pub const APP_TYPE_APPLICATION: &str = "application";

/// A locally tracked catalog entry, optionally backed by a [`Repository`].
///
/// One repository may fan out to many apps; matching happens by `repo_id` or
/// by the derived `https://github.com/{full_name}` URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub watchers: i64,
    pub contributors: i64,
    pub pull_requests: i64,
    pub releases: i64,
    pub commits: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub languages: Vec<String>,
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    pub app_type: String,
    pub source: String,
    pub status: AppStatus,
    pub publish_status: PublishStatus,
    pub analysed: bool,
    pub featured: bool,
    pub verified: bool,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
