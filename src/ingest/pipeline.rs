use chrono::{DateTime, Utc};
use rusqlite::Transaction;
use serde::Serialize;

use super::{apps, repository, snapshots, tags};
use crate::error::Result;
use crate::store::{IngestTxn, SqliteStore};
use crate::types::RepositoryPayload;

/// What one successfully processed delivery produced.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub repo_id: String,
    pub daily_snapshot_id: i64,
    pub monthly_snapshot_id: i64,
    pub weekly_snapshot_id: i64,
    pub apps_count: usize,
    pub processed_at: DateTime<Utc>,
}

/// Processes one validated webhook delivery inside a single transaction.
/// Any fatal step rolls the whole delivery back; nothing partial persists.
pub fn process_delivery(store: &SqliteStore, payload: &RepositoryPayload) -> Result<IngestReceipt> {
    let now = Utc::now();
    let mut conn = store.connection();
    let tx = conn.transaction()?;

    let receipt = run_pipeline(&tx, payload, now).inspect_err(|e| {
        tracing::error!(repo_id = %payload.id, "Delivery failed, rolling back: {e}");
    })?;

    tx.commit()?;
    Ok(receipt)
}

/// The pipeline body, separated from commit handling so tests can exercise
/// rollback. Step order: repository upsert, topic reconciliation (tags ahead
/// of app linkage), snapshots, app reconciliation.
pub(crate) fn run_pipeline(
    tx: &Transaction<'_>,
    payload: &RepositoryPayload,
    now: DateTime<Utc>,
) -> Result<IngestReceipt> {
    let ctx = IngestTxn::new(tx);

    let repo = repository::upsert(&ctx, payload, now)?;
    let topic_tags = tags::reconcile(&ctx, &repo);
    let (daily_id, monthly_id, weekly_id) = snapshots::record(&ctx, &repo.id, payload, now)?;
    let affected = apps::reconcile(&ctx, &repo, now)?;

    tracing::info!(
        repo_id = %repo.id,
        tags = topic_tags.len(),
        apps = affected.len(),
        "Reconciled repository delivery"
    );

    Ok(IngestReceipt {
        repo_id: repo.id,
        daily_snapshot_id: daily_id,
        monthly_snapshot_id: monthly_id,
        weekly_snapshot_id: weekly_id,
        apps_count: affected.len(),
        processed_at: now,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;
    use crate::store::IngestTxn;
    use crate::types::*;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn payload(id: &str, full_name: &str, stars: i64, topics: &[&str]) -> RepositoryPayload {
        let value = serde_json::json!({
            "id": id,
            "full_name": full_name,
            "name": full_name.rsplit('/').next().unwrap(),
            "owner": full_name.split('/').next().unwrap(),
            "owner_id": "O1",
            "created_at": "2020-01-01T00:00:00Z",
            "pushed_at": "2025-05-31T12:00:00Z",
            "added_at": "2024-01-01T00:00:00Z",
            "stars": stars,
            "forks": 3,
            "topics": topics,
            "homepage": "https://widget.example.com",
            "processing_status": {},
            "meta": {
                "task_name": "crawl",
                "processed_at": "2025-06-01T00:00:00Z",
                "processing_time_ms": 42,
                "success": true
            }
        });
        serde_json::from_value(value).unwrap()
    }

    fn blank_app(github: Option<&str>, repo_id: Option<&str>) -> App {
        let now = Utc::now();
        App {
            id: Uuid::new_v4().to_string(),
            slug: "existing".to_string(),
            name: "Existing".to_string(),
            repo_id: repo_id.map(str::to_string),
            github: github.map(str::to_string),
            website: None,
            description: None,
            long_description: None,
            icon: None,
            banner: None,
            stars: 0,
            forks: 0,
            watchers: 0,
            contributors: 0,
            pull_requests: 0,
            releases: 0,
            commits: 0,
            last_commit_at: None,
            license: None,
            languages: Vec::new(),
            topics: Vec::new(),
            version: None,
            readme: None,
            app_type: APP_TYPE_APPLICATION.to_string(),
            source: "manual".to_string(),
            status: AppStatus::Approved,
            publish_status: PublishStatus::Online,
            analysed: true,
            featured: false,
            verified: true,
            deleted: false,
            repo_created_at: None,
            default_branch: None,
            last_analyzed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn insert_app(store: &SqliteStore, app: &App) {
        let mut conn = store.connection();
        let tx = conn.transaction().unwrap();
        IngestTxn::new(&tx).apps().insert(app).unwrap();
        tx.commit().unwrap();
    }

    fn deliver(store: &SqliteStore, payload: &RepositoryPayload) -> IngestReceipt {
        process_delivery(store, payload).unwrap()
    }

    #[test]
    fn test_first_delivery_creates_everything() {
        let (_temp, store) = test_store();
        let receipt = deliver(&store, &payload("R1", "acme/widget", 10, &["cli", "rust"]));

        assert_eq!(receipt.repo_id, "R1");
        assert_eq!(receipt.apps_count, 1);

        let repo = store.get_repository("R1").unwrap().unwrap();
        assert_eq!(repo.full_name, "acme/widget");
        assert_eq!(repo.stars, Some(10));
        assert_eq!(repo.topics, vec!["cli", "rust"]);
        // Unreported metrics stay null on the repository record
        assert_eq!(repo.watchers, None);

        assert!(store.get_tag_by_name("cli").unwrap().is_some());
        assert!(store.get_tag_by_name("rust").unwrap().is_some());

        let apps = store.list_apps_for_repo("R1").unwrap();
        assert_eq!(apps.len(), 1);
        let app = &apps[0];
        assert_eq!(app.status, AppStatus::Pending);
        assert_eq!(app.publish_status, PublishStatus::Offline);
        assert_eq!(app.github.as_deref(), Some("https://github.com/acme/widget"));
        assert_eq!(app.stars, 10);
        assert!(!app.analysed);
        // Zero-defaulting on the app, unlike the repository record
        assert_eq!(app.watchers, 0);

        let daily = store.list_daily_snapshots("R1").unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].metrics.stars, 10);
        assert_eq!(store.list_monthly_snapshots("R1").unwrap().len(), 1);
        assert_eq!(store.list_weekly_snapshots("R1").unwrap().len(), 1);
    }

    #[test]
    fn test_second_delivery_appends_daily_and_replaces_periods() {
        let (_temp, store) = test_store();
        deliver(&store, &payload("R1", "acme/widget", 10, &["cli"]));
        deliver(&store, &payload("R1", "acme/widget", 25, &["cli"]));

        let repo = store.get_repository("R1").unwrap().unwrap();
        assert_eq!(repo.stars, Some(25));

        // Daily appends, no dedup within a day
        let daily = store.list_daily_snapshots("R1").unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].metrics.stars, 10);
        assert_eq!(daily[1].metrics.stars, 25);

        // Monthly/weekly keep one row per period with the latest values,
        // not a sum
        let monthly = store.list_monthly_snapshots("R1").unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].metrics.stars, 25);
        let weekly = store.list_weekly_snapshots("R1").unwrap();
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].metrics.stars, 25);

        // Still exactly one app, updated in place
        let apps = store.list_apps_for_repo("R1").unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].stars, 25);
    }

    #[test]
    fn test_tag_creation_is_idempotent() {
        let (_temp, store) = test_store();
        deliver(&store, &payload("R1", "acme/widget", 10, &["cli", "rust"]));
        deliver(&store, &payload("R1", "acme/widget", 11, &["cli", "rust"]));

        assert_eq!(store.list_tags().unwrap().len(), 2);
    }

    #[test]
    fn test_blank_topics_are_skipped_not_fatal() {
        let (_temp, store) = test_store();
        deliver(&store, &payload("R1", "acme/widget", 10, &["", "  ", "cli"]));

        let tags = store.list_tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "cli");
        assert_eq!(tags[0].slug, "cli");
        assert_eq!(tags[0].source, TAG_SOURCE_GITHUB_TOPIC);
    }

    #[test]
    fn test_app_fan_out_by_id_and_url() {
        let (_temp, store) = test_store();
        // First delivery creates the repository and one app bound by repo_id
        deliver(&store, &payload("R1", "acme/widget", 10, &[]));

        // A second app references the repository only by its GitHub URL
        let url_app = blank_app(Some("https://github.com/acme/widget"), None);
        insert_app(&store, &url_app);

        deliver(&store, &payload("R1", "acme/widget", 25, &[]));

        // Both apps received the update, and the URL-matched one was adopted
        let apps = store.list_apps_for_repo("R1").unwrap();
        assert_eq!(apps.len(), 2);
        for app in &apps {
            assert_eq!(app.stars, 25);
            assert_eq!(app.repo_id.as_deref(), Some("R1"));
        }
        // Curated fields survive reconciliation
        let adopted = store.get_app(&url_app.id).unwrap().unwrap();
        assert_eq!(adopted.status, AppStatus::Approved);
        assert_eq!(adopted.publish_status, PublishStatus::Online);
        assert_eq!(adopted.name, "Existing");
    }

    #[test]
    fn test_apps_bound_by_id_get_tag_associations() {
        let (_temp, store) = test_store();
        // Delivery one synthesizes the app; delivery two associates tags with
        // it now that its repo_id is set
        deliver(&store, &payload("R1", "acme/widget", 10, &["cli", "rust"]));
        deliver(&store, &payload("R1", "acme/widget", 11, &["cli", "rust"]));

        let apps = store.list_apps_for_repo("R1").unwrap();
        let tags = store.list_app_tags(&apps[0].id).unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["cli", "rust"]);

        // A third delivery must not duplicate associations
        deliver(&store, &payload("R1", "acme/widget", 12, &["cli", "rust"]));
        assert_eq!(store.list_app_tags(&apps[0].id).unwrap().len(), 2);
    }

    #[test]
    fn test_website_only_replaced_by_non_blank_homepage() {
        let (_temp, store) = test_store();
        deliver(&store, &payload("R1", "acme/widget", 10, &[]));

        let mut blank = payload("R1", "acme/widget", 12, &[]);
        blank.homepage = Some("   ".to_string());
        deliver(&store, &blank);

        let apps = store.list_apps_for_repo("R1").unwrap();
        assert_eq!(
            apps[0].website.as_deref(),
            Some("https://widget.example.com")
        );
    }

    #[test]
    fn test_uncommitted_pipeline_persists_nothing() {
        let (_temp, store) = test_store();
        let p = payload("R1", "acme/widget", 10, &["cli"]);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        {
            let mut conn = store.connection();
            let tx = conn.transaction().unwrap();
            run_pipeline(&tx, &p, now).unwrap();
            tx.rollback().unwrap();
        }

        assert!(store.get_repository("R1").unwrap().is_none());
        assert!(store.list_tags().unwrap().is_empty());
        assert!(store.list_apps_for_repo("R1").unwrap().is_empty());
        assert!(store.list_daily_snapshots("R1").unwrap().is_empty());
    }

    #[test]
    fn test_banner_prefers_cached_og_image() {
        let (_temp, store) = test_store();
        let mut p = payload("R1", "acme/widget", 10, &[]);
        p.og_image_url = Some("https://github.com/og.png".to_string());
        p.og_image_oss_url = Some("https://cdn.example.com/og.png".to_string());
        deliver(&store, &p);

        let apps = store.list_apps_for_repo("R1").unwrap();
        assert_eq!(
            apps[0].banner.as_deref(),
            Some("https://cdn.example.com/og.png")
        );
    }

    #[test]
    fn test_version_tracks_latest_release_tag() {
        let (_temp, store) = test_store();
        let mut p = payload("R1", "acme/widget", 10, &[]);
        p.latest_release = serde_json::from_value(serde_json::json!({
            "name": "Widget 1.2",
            "tag_name": "v1.2.0",
            "published_at": "2025-05-30T00:00:00Z"
        }))
        .unwrap();
        deliver(&store, &p);

        let repo = store.get_repository("R1").unwrap().unwrap();
        assert_eq!(repo.latest_release_tag.as_deref(), Some("v1.2.0"));
        let apps = store.list_apps_for_repo("R1").unwrap();
        assert_eq!(apps[0].version.as_deref(), Some("v1.2.0"));
    }
}
