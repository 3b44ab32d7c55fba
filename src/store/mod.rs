mod rows;
mod schema;
mod sqlite;
mod txn;

pub use sqlite::SqliteStore;
pub use txn::{Apps, IngestTxn, Repositories, Snapshots, Tags};
