//! Pipeline lifecycle state and its persistence.
//!
//! The current `PipelineState` plus a bounded append-only history are
//! persisted per (name, rev) so lifecycle is recoverable across restarts.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteStateStore;
pub use store::{StateStore, StateStoreError};
pub use types::{PipelineState, State};
