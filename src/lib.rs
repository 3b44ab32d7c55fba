//! # Repowatch
//!
//! A webhook ingestion server that mirrors upstream GitHub repository state
//! into a local app catalog, usable both as a standalone binary and as a
//! library.
//!
//! An upstream crawler POSTs `repo_updated` deliveries to `/webhooks/repo`.
//! Each delivery is validated, then processed inside a single database
//! transaction: the canonical repository record is upserted, daily/weekly/
//! monthly snapshot rows are written, repository topics are reconciled into
//! the tag taxonomy, and any catalog apps tracking the repository are brought
//! up to date (or one is synthesized if none exist).
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use repowatch::server::{AppState, create_router};
//! use repowatch::store::SqliteStore;
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/repowatch.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     webhook_secret: None,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the binary's CLI. Disable with
//!   `default-features = false`.

pub mod config;
pub mod error;
pub mod ingest;
pub mod server;
pub mod store;
pub mod types;
