//! The webhook reconciliation pipeline: repository upsert, snapshot
//! aggregation, topic-to-tag reconciliation, and app reconciliation, all
//! inside one transaction per delivery.

mod apps;
mod pipeline;
mod repository;
mod slug;
mod snapshots;
mod tags;

pub use pipeline::{IngestReceipt, process_delivery};
pub use slug::slugify;
pub use snapshots::week_of_year;
