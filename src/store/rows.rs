//! Row-mapping helpers shared by the read-side store and the ingest
//! transaction context.

use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::types::*;

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Topics and languages are stored as JSON arrays of strings.
pub(crate) fn parse_string_list(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::error!("Invalid JSON list in database: '{}' - {}", s, e);
        Vec::new()
    })
}

pub(crate) fn format_string_list(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) const REPOSITORY_COLUMNS: &str = "id, full_name, name, owner, owner_id, description, localized_description, homepage, \
     topics, languages, license, default_branch, archived, \
     stars, forks, watchers, contributors, pull_requests, releases, commits, \
     readme, localized_readme, \
     latest_release_name, latest_release_tag, latest_release_published_at, \
     latest_release_url, latest_release_description, \
     icon_url, og_image_url, og_image_oss_url, \
     created_at, pushed_at, last_commit_at, added_at, updated_at";

pub(crate) fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        full_name: row.get(1)?,
        name: row.get(2)?,
        owner: row.get(3)?,
        owner_id: row.get(4)?,
        description: row.get(5)?,
        localized_description: row.get(6)?,
        homepage: row.get(7)?,
        topics: parse_string_list(&row.get::<_, String>(8)?),
        languages: parse_string_list(&row.get::<_, String>(9)?),
        license: row.get(10)?,
        default_branch: row.get(11)?,
        archived: row.get(12)?,
        stars: row.get(13)?,
        forks: row.get(14)?,
        watchers: row.get(15)?,
        contributors: row.get(16)?,
        pull_requests: row.get(17)?,
        releases: row.get(18)?,
        commits: row.get(19)?,
        readme: row.get(20)?,
        localized_readme: row.get(21)?,
        latest_release_name: row.get(22)?,
        latest_release_tag: row.get(23)?,
        latest_release_published_at: row
            .get::<_, Option<String>>(24)?
            .map(|s| parse_datetime(&s)),
        latest_release_url: row.get(25)?,
        latest_release_description: row.get(26)?,
        icon_url: row.get(27)?,
        og_image_url: row.get(28)?,
        og_image_oss_url: row.get(29)?,
        created_at: parse_datetime(&row.get::<_, String>(30)?),
        pushed_at: parse_datetime(&row.get::<_, String>(31)?),
        last_commit_at: row.get::<_, Option<String>>(32)?.map(|s| parse_datetime(&s)),
        added_at: parse_datetime(&row.get::<_, String>(33)?),
        updated_at: parse_datetime(&row.get::<_, String>(34)?),
    })
}

pub(crate) const APP_COLUMNS: &str = "id, slug, name, repo_id, github, website, description, long_description, icon, banner, \
     stars, forks, watchers, contributors, pull_requests, releases, commits, \
     last_commit_at, license, languages, topics, version, readme, \
     app_type, source, status, publish_status, \
     analysed, featured, verified, deleted, \
     repo_created_at, default_branch, last_analyzed_at, created_at, updated_at";

pub(crate) fn app_from_row(row: &Row<'_>) -> rusqlite::Result<App> {
    Ok(App {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        repo_id: row.get(3)?,
        github: row.get(4)?,
        website: row.get(5)?,
        description: row.get(6)?,
        long_description: row.get(7)?,
        icon: row.get(8)?,
        banner: row.get(9)?,
        stars: row.get(10)?,
        forks: row.get(11)?,
        watchers: row.get(12)?,
        contributors: row.get(13)?,
        pull_requests: row.get(14)?,
        releases: row.get(15)?,
        commits: row.get(16)?,
        last_commit_at: row.get::<_, Option<String>>(17)?.map(|s| parse_datetime(&s)),
        license: row.get(18)?,
        languages: parse_string_list(&row.get::<_, String>(19)?),
        topics: parse_string_list(&row.get::<_, String>(20)?),
        version: row.get(21)?,
        readme: row.get(22)?,
        app_type: row.get(23)?,
        source: row.get(24)?,
        status: AppStatus::from_db(&row.get::<_, String>(25)?),
        publish_status: PublishStatus::from_db(&row.get::<_, String>(26)?),
        analysed: row.get(27)?,
        featured: row.get(28)?,
        verified: row.get(29)?,
        deleted: row.get(30)?,
        repo_created_at: row.get::<_, Option<String>>(31)?.map(|s| parse_datetime(&s)),
        default_branch: row.get(32)?,
        last_analyzed_at: row.get::<_, Option<String>>(33)?.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&row.get::<_, String>(34)?),
        updated_at: parse_datetime(&row.get::<_, String>(35)?),
    })
}

pub(crate) const TAG_COLUMNS: &str =
    "id, name, slug, source, tag_type, description, created_at";

pub(crate) fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        source: row.get(3)?,
        tag_type: row.get(4)?,
        description: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

pub(crate) fn metrics_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<SnapshotMetrics> {
    Ok(SnapshotMetrics {
        stars: row.get(offset)?,
        forks: row.get(offset + 1)?,
        watchers: row.get(offset + 2)?,
        contributors: row.get(offset + 3)?,
        pull_requests: row.get(offset + 4)?,
        releases: row.get(offset + 5)?,
        commits: row.get(offset + 6)?,
    })
}

pub(crate) fn daily_from_row(row: &Row<'_>) -> rusqlite::Result<DailySnapshot> {
    Ok(DailySnapshot {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        day: row.get(4)?,
        metrics: metrics_from_row(row, 5)?,
        created_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

pub(crate) fn monthly_from_row(row: &Row<'_>) -> rusqlite::Result<MonthlySnapshot> {
    Ok(MonthlySnapshot {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        metrics: metrics_from_row(row, 4)?,
        created_at: parse_datetime(&row.get::<_, String>(11)?),
        updated_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

pub(crate) fn weekly_from_row(row: &Row<'_>) -> rusqlite::Result<WeeklySnapshot> {
    Ok(WeeklySnapshot {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        year: row.get(2)?,
        week: row.get(3)?,
        metrics: metrics_from_row(row, 4)?,
        created_at: parse_datetime(&row.get::<_, String>(11)?),
        updated_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}
