use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use super::rows::*;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

/// SQLite-backed store. All ingest mutations happen through
/// [`super::IngestTxn`] inside a transaction obtained from [`Self::connection`];
/// the methods here are the read-side surface used by the HTTP API and tests.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        self.connection().execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Returns a guard to the underlying database connection. The ingest
    /// pipeline opens its transaction on this guard.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_repository(&self, id: &str) -> Result<Option<Repository>> {
        let conn = self.connection();
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?1"),
            params![id],
            repository_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn get_repository_by_full_name(&self, full_name: &str) -> Result<Option<Repository>> {
        let conn = self.connection();
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE full_name = ?1"),
            params![full_name],
            repository_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn list_daily_snapshots(&self, repo_id: &str) -> Result<Vec<DailySnapshot>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, year, month, day, \
                    stars, forks, watchers, contributors, pull_requests, releases, commits, \
                    created_at \
             FROM repo_snapshots_daily WHERE repo_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![repo_id], daily_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn list_monthly_snapshots(&self, repo_id: &str) -> Result<Vec<MonthlySnapshot>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, year, month, \
                    stars, forks, watchers, contributors, pull_requests, releases, commits, \
                    created_at, updated_at \
             FROM repo_snapshots_monthly WHERE repo_id = ?1 ORDER BY year, month",
        )?;

        let rows = stmt.query_map(params![repo_id], monthly_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn list_weekly_snapshots(&self, repo_id: &str) -> Result<Vec<WeeklySnapshot>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, year, week, \
                    stars, forks, watchers, contributors, pull_requests, releases, commits, \
                    created_at, updated_at \
             FROM repo_snapshots_weekly WHERE repo_id = ?1 ORDER BY year, week",
        )?;

        let rows = stmt.query_map(params![repo_id], weekly_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.connection();
        let mut stmt =
            conn.prepare(&format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY name"))?;

        let rows = stmt.query_map([], tag_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let conn = self.connection();
        conn.query_row(
            &format!("SELECT {TAG_COLUMNS} FROM tags WHERE name = ?1"),
            params![name],
            tag_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn get_app(&self, id: &str) -> Result<Option<App>> {
        let conn = self.connection();
        conn.query_row(
            &format!("SELECT {APP_COLUMNS} FROM apps WHERE id = ?1"),
            params![id],
            app_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn list_apps_for_repo(&self, repo_id: &str) -> Result<Vec<App>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE repo_id = ?1 ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![repo_id], app_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn list_app_tags(&self, app_id: &str) -> Result<Vec<Tag>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.slug, t.source, t.tag_type, t.description, t.created_at
             FROM tags t
             JOIN app_tags at ON t.id = at.tag_id
             WHERE at.app_id = ?1
             ORDER BY t.name",
        )?;

        let rows = stmt.query_map(params![app_id], tag_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let conn = store.connection();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"repositories".to_string()));
        assert!(tables.contains(&"repo_snapshots_daily".to_string()));
        assert!(tables.contains(&"repo_snapshots_monthly".to_string()));
        assert!(tables.contains(&"repo_snapshots_weekly".to_string()));
        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"apps".to_string()));
        assert!(tables.contains(&"app_tags".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store.initialize().unwrap();
    }

    #[test]
    fn test_empty_reads() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        assert!(store.get_repository("missing").unwrap().is_none());
        assert!(store.list_daily_snapshots("missing").unwrap().is_empty());
        assert!(store.list_tags().unwrap().is_empty());
        assert!(store.list_apps_for_repo("missing").unwrap().is_empty());
    }
}
