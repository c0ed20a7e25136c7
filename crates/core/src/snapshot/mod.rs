//! Snapshot capture and storage.
//!
//! A snapshot is one batch of records captured from the running
//! pipeline for debugging. Capture is asynchronous: a request returns
//! immediately and the [`SnapshotController`] persists the payload
//! once the engine hands it over.

mod controller;
mod sqlite;
mod store;
mod types;

pub use controller::SnapshotController;
pub use sqlite::SqliteSnapshotStore;
pub use store::SnapshotStore;
pub use types::{SnapshotError, SnapshotStatus};
