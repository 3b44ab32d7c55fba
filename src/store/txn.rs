use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Transaction, params};

use super::rows::*;
use crate::error::{Error, Result};
use crate::types::*;

/// Typed view over one ingest transaction.
///
/// Every mutation the pipeline performs goes through the accessors returned
/// here, so the orchestrator's contract is statically checkable and all
/// writes share one atomic commit/rollback boundary.
pub struct IngestTxn<'a> {
    tx: &'a Transaction<'a>,
}

impl<'a> IngestTxn<'a> {
    pub fn new(tx: &'a Transaction<'a>) -> Self {
        Self { tx }
    }

    pub fn repositories(&self) -> Repositories<'_> {
        Repositories { tx: self.tx }
    }

    pub fn snapshots(&self) -> Snapshots<'_> {
        Snapshots { tx: self.tx }
    }

    pub fn tags(&self) -> Tags<'_> {
        Tags { tx: self.tx }
    }

    pub fn apps(&self) -> Apps<'_> {
        Apps { tx: self.tx }
    }
}

pub struct Repositories<'a> {
    tx: &'a Transaction<'a>,
}

impl Repositories<'_> {
    /// Looks up a repository by external id or by `owner/name`.
    pub fn find(&self, id: &str, full_name: &str) -> Result<Option<Repository>> {
        self.tx
            .query_row(
                &format!(
                    "SELECT {REPOSITORY_COLUMNS} FROM repositories \
                     WHERE id = ?1 OR full_name = ?2"
                ),
                params![id, full_name],
                repository_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    pub fn insert(&self, repo: &Repository) -> Result<()> {
        self.tx.execute(
            &format!(
                "INSERT INTO repositories ({REPOSITORY_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
                  ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, \
                  ?33, ?34, ?35)"
            ),
            params![
                repo.id,
                repo.full_name,
                repo.name,
                repo.owner,
                repo.owner_id,
                repo.description,
                repo.localized_description,
                repo.homepage,
                format_string_list(&repo.topics),
                format_string_list(&repo.languages),
                repo.license,
                repo.default_branch,
                repo.archived,
                repo.stars,
                repo.forks,
                repo.watchers,
                repo.contributors,
                repo.pull_requests,
                repo.releases,
                repo.commits,
                repo.readme,
                repo.localized_readme,
                repo.latest_release_name,
                repo.latest_release_tag,
                repo.latest_release_published_at.as_ref().map(format_datetime),
                repo.latest_release_url,
                repo.latest_release_description,
                repo.icon_url,
                repo.og_image_url,
                repo.og_image_oss_url,
                format_datetime(&repo.created_at),
                format_datetime(&repo.pushed_at),
                repo.last_commit_at.as_ref().map(format_datetime),
                format_datetime(&repo.added_at),
                format_datetime(&repo.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Rewrites every mutable field of the row identified by `existing_id`.
    /// The id column is written too, covering the rare case where the row was
    /// matched by full name and upstream reassigned the id.
    pub fn update(&self, existing_id: &str, repo: &Repository) -> Result<()> {
        let rows = self.tx.execute(
            "UPDATE repositories SET \
                id = ?36, \
                full_name = ?1, name = ?2, owner = ?3, owner_id = ?4, description = ?5, \
                localized_description = ?6, homepage = ?7, topics = ?8, languages = ?9, \
                license = ?10, default_branch = ?11, archived = ?12, \
                stars = ?13, forks = ?14, watchers = ?15, contributors = ?16, \
                pull_requests = ?17, releases = ?18, commits = ?19, \
                readme = ?20, localized_readme = ?21, \
                latest_release_name = ?22, latest_release_tag = ?23, \
                latest_release_published_at = ?24, latest_release_url = ?25, \
                latest_release_description = ?26, \
                icon_url = ?27, og_image_url = ?28, og_image_oss_url = ?29, \
                created_at = ?30, pushed_at = ?31, last_commit_at = ?32, added_at = ?33, \
                updated_at = ?34 \
             WHERE id = ?35",
            params![
                repo.full_name,
                repo.name,
                repo.owner,
                repo.owner_id,
                repo.description,
                repo.localized_description,
                repo.homepage,
                format_string_list(&repo.topics),
                format_string_list(&repo.languages),
                repo.license,
                repo.default_branch,
                repo.archived,
                repo.stars,
                repo.forks,
                repo.watchers,
                repo.contributors,
                repo.pull_requests,
                repo.releases,
                repo.commits,
                repo.readme,
                repo.localized_readme,
                repo.latest_release_name,
                repo.latest_release_tag,
                repo.latest_release_published_at.as_ref().map(format_datetime),
                repo.latest_release_url,
                repo.latest_release_description,
                repo.icon_url,
                repo.og_image_url,
                repo.og_image_oss_url,
                format_datetime(&repo.created_at),
                format_datetime(&repo.pushed_at),
                repo.last_commit_at.as_ref().map(format_datetime),
                format_datetime(&repo.added_at),
                format_datetime(&repo.updated_at),
                existing_id,
                repo.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::Integrity(format!(
                "repository {} vanished during update",
                repo.id
            )));
        }
        Ok(())
    }
}

pub struct Snapshots<'a> {
    tx: &'a Transaction<'a>,
}

impl Snapshots<'_> {
    /// Appends one daily row. Intentionally no conflict handling: every
    /// delivery inserts, even a second delivery on the same calendar day.
    pub fn insert_daily(
        &self,
        repo_id: &str,
        year: i32,
        month: u32,
        day: u32,
        metrics: &SnapshotMetrics,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        self.tx.execute(
            "INSERT INTO repo_snapshots_daily \
                (repo_id, year, month, day, \
                 stars, forks, watchers, contributors, pull_requests, releases, commits, \
                 created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                repo_id,
                year,
                month,
                day,
                metrics.stars,
                metrics.forks,
                metrics.watchers,
                metrics.contributors,
                metrics.pull_requests,
                metrics.releases,
                metrics.commits,
                format_datetime(&now),
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    /// Replace-semantics upsert keyed by (repo, year, month). Returns the id
    /// of the period row; a missing row after the write is an integrity error.
    pub fn upsert_monthly(
        &self,
        repo_id: &str,
        year: i32,
        month: u32,
        metrics: &SnapshotMetrics,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        self.tx.execute(
            "INSERT INTO repo_snapshots_monthly \
                (repo_id, year, month, \
                 stars, forks, watchers, contributors, pull_requests, releases, commits, \
                 created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11) \
             ON CONFLICT (repo_id, year, month) DO UPDATE SET \
                stars = excluded.stars, forks = excluded.forks, \
                watchers = excluded.watchers, contributors = excluded.contributors, \
                pull_requests = excluded.pull_requests, releases = excluded.releases, \
                commits = excluded.commits, updated_at = excluded.updated_at",
            params![
                repo_id,
                year,
                month,
                metrics.stars,
                metrics.forks,
                metrics.watchers,
                metrics.contributors,
                metrics.pull_requests,
                metrics.releases,
                metrics.commits,
                format_datetime(&now),
            ],
        )?;

        self.tx
            .query_row(
                "SELECT id FROM repo_snapshots_monthly \
                 WHERE repo_id = ?1 AND year = ?2 AND month = ?3",
                params![repo_id, year, month],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                Error::Integrity(format!(
                    "monthly snapshot missing after upsert for repo {repo_id}"
                ))
            })
    }

    /// Replace-semantics upsert keyed by (repo, year, week).
    pub fn upsert_weekly(
        &self,
        repo_id: &str,
        year: i32,
        week: u32,
        metrics: &SnapshotMetrics,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        self.tx.execute(
            "INSERT INTO repo_snapshots_weekly \
                (repo_id, year, week, \
                 stars, forks, watchers, contributors, pull_requests, releases, commits, \
                 created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11) \
             ON CONFLICT (repo_id, year, week) DO UPDATE SET \
                stars = excluded.stars, forks = excluded.forks, \
                watchers = excluded.watchers, contributors = excluded.contributors, \
                pull_requests = excluded.pull_requests, releases = excluded.releases, \
                commits = excluded.commits, updated_at = excluded.updated_at",
            params![
                repo_id,
                year,
                week,
                metrics.stars,
                metrics.forks,
                metrics.watchers,
                metrics.contributors,
                metrics.pull_requests,
                metrics.releases,
                metrics.commits,
                format_datetime(&now),
            ],
        )?;

        self.tx
            .query_row(
                "SELECT id FROM repo_snapshots_weekly \
                 WHERE repo_id = ?1 AND year = ?2 AND week = ?3",
                params![repo_id, year, week],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                Error::Integrity(format!(
                    "weekly snapshot missing after upsert for repo {repo_id}"
                ))
            })
    }
}

pub struct Tags<'a> {
    tx: &'a Transaction<'a>,
}

impl Tags<'_> {
    pub fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.tx
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM tags WHERE name = ?1"),
                params![name],
                tag_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    /// Create-if-absent. The UNIQUE(name) constraint is the real safety net
    /// under concurrent deliveries; a losing insert is silently ignored and
    /// the caller fetches the surviving row.
    pub fn insert_or_ignore(&self, tag: &Tag) -> Result<()> {
        self.tx.execute(
            &format!(
                "INSERT OR IGNORE INTO tags ({TAG_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                tag.id,
                tag.name,
                tag.slug,
                tag.source,
                tag.tag_type,
                tag.description,
                format_datetime(&tag.created_at),
            ],
        )?;
        Ok(())
    }
}

pub struct Apps<'a> {
    tx: &'a Transaction<'a>,
}

impl Apps<'_> {
    /// Apps tracking the repository: matched by foreign key, or by the
    /// canonical GitHub URL for apps recorded before the repository was seen.
    pub fn find_for_repo(&self, repo_id: &str, github_url: &str) -> Result<Vec<App>> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {APP_COLUMNS} FROM apps \
             WHERE repo_id = ?1 OR github = ?2 ORDER BY created_at"
        ))?;

        let rows = stmt.query_map(params![repo_id, github_url], app_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Ids of apps already bound to the repository by foreign key. Used by
    /// topic reconciliation, which runs before URL-matched apps are adopted.
    pub fn ids_for_repo(&self, repo_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .tx
            .prepare("SELECT id FROM apps WHERE repo_id = ?1 ORDER BY id")?;

        let rows = stmt.query_map(params![repo_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn insert(&self, app: &App) -> Result<()> {
        self.tx.execute(
            &format!(
                "INSERT INTO apps ({APP_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
                  ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, \
                  ?33, ?34, ?35, ?36)"
            ),
            params![
                app.id,
                app.slug,
                app.name,
                app.repo_id,
                app.github,
                app.website,
                app.description,
                app.long_description,
                app.icon,
                app.banner,
                app.stars,
                app.forks,
                app.watchers,
                app.contributors,
                app.pull_requests,
                app.releases,
                app.commits,
                app.last_commit_at.as_ref().map(format_datetime),
                app.license,
                format_string_list(&app.languages),
                format_string_list(&app.topics),
                app.version,
                app.readme,
                app.app_type,
                app.source,
                app.status.as_str(),
                app.publish_status.as_str(),
                app.analysed,
                app.featured,
                app.verified,
                app.deleted,
                app.repo_created_at.as_ref().map(format_datetime),
                app.default_branch,
                app.last_analyzed_at.as_ref().map(format_datetime),
                format_datetime(&app.created_at),
                format_datetime(&app.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Writes the repository-derived fields of an app. Curated fields (slug,
    /// name, status, flags) are left alone.
    pub fn update_derived(&self, app: &App) -> Result<()> {
        let rows = self.tx.execute(
            "UPDATE apps SET \
                repo_id = ?1, website = ?2, description = ?3, long_description = ?4, \
                icon = ?5, banner = ?6, \
                stars = ?7, forks = ?8, watchers = ?9, contributors = ?10, \
                pull_requests = ?11, releases = ?12, commits = ?13, \
                last_commit_at = ?14, license = ?15, languages = ?16, topics = ?17, \
                version = ?18, readme = ?19, repo_created_at = ?20, default_branch = ?21, \
                last_analyzed_at = ?22, updated_at = ?23 \
             WHERE id = ?24",
            params![
                app.repo_id,
                app.website,
                app.description,
                app.long_description,
                app.icon,
                app.banner,
                app.stars,
                app.forks,
                app.watchers,
                app.contributors,
                app.pull_requests,
                app.releases,
                app.commits,
                app.last_commit_at.as_ref().map(format_datetime),
                app.license,
                format_string_list(&app.languages),
                format_string_list(&app.topics),
                app.version,
                app.readme,
                app.repo_created_at.as_ref().map(format_datetime),
                app.default_branch,
                app.last_analyzed_at.as_ref().map(format_datetime),
                format_datetime(&app.updated_at),
                app.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::Integrity(format!(
                "app {} vanished during update",
                app.id
            )));
        }
        Ok(())
    }

    /// Existence pre-check for an (app, tag) association. An optimization:
    /// the primary key on app_tags is the actual duplicate guard.
    pub fn has_tag(&self, app_id: &str, tag_id: &str) -> Result<bool> {
        let count: i32 = self.tx.query_row(
            "SELECT COUNT(*) FROM app_tags WHERE app_id = ?1 AND tag_id = ?2",
            params![app_id, tag_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn add_tag(&self, app_id: &str, tag_id: &str) -> Result<()> {
        self.tx.execute(
            "INSERT OR IGNORE INTO app_tags (app_id, tag_id) VALUES (?1, ?2)",
            params![app_id, tag_id],
        )?;
        Ok(())
    }
}
