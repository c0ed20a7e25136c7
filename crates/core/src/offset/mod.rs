//! Source offset checkpointing.
//!
//! The offset is an opaque resume token persisted per (name, rev) so
//! ingestion can continue from the last durably consumed position after
//! a restart.

mod sqlite;
mod store;

pub use sqlite::SqliteOffsetStore;
pub use store::{OffsetStore, OffsetStoreError, SourceOffset};
