pub const SCHEMA: &str = r#"
-- Canonical mirror of upstream repositories, keyed by the crawler's
-- stable external id. Updated in place, never deleted by the pipeline.
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL UNIQUE,  -- owner/name, secondary lookup key
    name TEXT NOT NULL,
    owner TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    description TEXT,
    localized_description TEXT,
    homepage TEXT,
    topics TEXT NOT NULL DEFAULT '[]',     -- JSON array of strings
    languages TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    license TEXT,
    default_branch TEXT,
    archived INTEGER NOT NULL DEFAULT 0,

    -- Metrics: NULL means the crawler did not report a value
    stars INTEGER,
    forks INTEGER,
    watchers INTEGER,
    contributors INTEGER,
    pull_requests INTEGER,
    releases INTEGER,
    commits INTEGER,

    readme TEXT,
    localized_readme TEXT,

    latest_release_name TEXT,
    latest_release_tag TEXT,
    latest_release_published_at TEXT,
    latest_release_url TEXT,
    latest_release_description TEXT,

    icon_url TEXT,
    og_image_url TEXT,
    og_image_oss_url TEXT,  -- processed/cached variant

    created_at TEXT NOT NULL,
    pushed_at TEXT NOT NULL,
    last_commit_at TEXT,
    added_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Append-only daily measurements. No uniqueness on (repo_id, year, month,
-- day): every delivery appends a row, even within the same day.
CREATE TABLE IF NOT EXISTS repo_snapshots_daily (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    day INTEGER NOT NULL,
    stars INTEGER NOT NULL DEFAULT 0,
    forks INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    contributors INTEGER NOT NULL DEFAULT 0,
    pull_requests INTEGER NOT NULL DEFAULT 0,
    releases INTEGER NOT NULL DEFAULT 0,
    commits INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Rolling monthly aggregate, last write within the period wins.
CREATE TABLE IF NOT EXISTS repo_snapshots_monthly (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    stars INTEGER NOT NULL DEFAULT 0,
    forks INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    contributors INTEGER NOT NULL DEFAULT 0,
    pull_requests INTEGER NOT NULL DEFAULT 0,
    releases INTEGER NOT NULL DEFAULT 0,
    commits INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE(repo_id, year, month)
);

-- Rolling weekly aggregate; week numbering is the pipeline's own
-- day-of-year formula, not ISO-8601.
CREATE TABLE IF NOT EXISTS repo_snapshots_weekly (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    week INTEGER NOT NULL,
    stars INTEGER NOT NULL DEFAULT 0,
    forks INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    contributors INTEGER NOT NULL DEFAULT 0,
    pull_requests INTEGER NOT NULL DEFAULT 0,
    releases INTEGER NOT NULL DEFAULT 0,
    commits INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE(repo_id, year, week)
);

-- Global tag taxonomy derived from upstream topics
CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL,
    source TEXT NOT NULL,
    tag_type TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

-- Locally tracked catalog entries, optionally backed by a repository
CREATE TABLE IF NOT EXISTS apps (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL,
    name TEXT NOT NULL,
    repo_id TEXT REFERENCES repositories(id) ON DELETE SET NULL,
    github TEXT,   -- canonical https://github.com/{full_name} URL
    website TEXT,
    description TEXT,
    long_description TEXT,
    icon TEXT,
    banner TEXT,
    stars INTEGER NOT NULL DEFAULT 0,
    forks INTEGER NOT NULL DEFAULT 0,
    watchers INTEGER NOT NULL DEFAULT 0,
    contributors INTEGER NOT NULL DEFAULT 0,
    pull_requests INTEGER NOT NULL DEFAULT 0,
    releases INTEGER NOT NULL DEFAULT 0,
    commits INTEGER NOT NULL DEFAULT 0,
    last_commit_at TEXT,
    license TEXT,
    languages TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    topics TEXT NOT NULL DEFAULT '[]',     -- JSON array of strings
    version TEXT,
    readme TEXT,
    app_type TEXT NOT NULL DEFAULT 'application',
    source TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    publish_status TEXT NOT NULL DEFAULT 'offline',
    analysed INTEGER NOT NULL DEFAULT 0,
    featured INTEGER NOT NULL DEFAULT 0,
    verified INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    repo_created_at TEXT,
    default_branch TEXT,
    last_analyzed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Many-to-many relationship between apps and tags
CREATE TABLE IF NOT EXISTS app_tags (
    app_id TEXT REFERENCES apps(id) ON DELETE CASCADE,
    tag_id TEXT REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (app_id, tag_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_snapshots_daily_repo ON repo_snapshots_daily(repo_id);
CREATE INDEX IF NOT EXISTS idx_snapshots_monthly_repo ON repo_snapshots_monthly(repo_id);
CREATE INDEX IF NOT EXISTS idx_snapshots_weekly_repo ON repo_snapshots_weekly(repo_id);
CREATE INDEX IF NOT EXISTS idx_apps_repo ON apps(repo_id);
CREATE INDEX IF NOT EXISTS idx_apps_github ON apps(github);
CREATE INDEX IF NOT EXISTS idx_app_tags_tag ON app_tags(tag_id);
"#;
