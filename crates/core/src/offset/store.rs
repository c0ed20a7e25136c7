//! Offset storage trait and types.

use serde::{Deserialize, Serialize};

/// Durable read checkpoint for a pipeline's data source.
///
/// The token is opaque to the control plane; only the execution engine
/// can interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOffset {
    pub offset: String,
}

impl SourceOffset {
    pub fn new(offset: impl Into<String>) -> Self {
        Self {
            offset: offset.into(),
        }
    }
}

/// Error type for offset store operations.
#[derive(Debug, thiserror::Error)]
pub enum OffsetStoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Persistence for the source offset, keyed by (name, rev).
///
/// The persisted value always reflects the last offset the engine
/// acknowledged as durably consumed, or one set explicitly by an
/// operator while the pipeline was stopped.
pub trait OffsetStore: Send + Sync {
    /// Load the persisted offset for a pipeline, if any.
    fn load(&self, name: &str, rev: &str) -> Result<Option<SourceOffset>, OffsetStoreError>;

    /// Persist a new offset, replacing any previous value.
    fn save(&self, name: &str, rev: &str, offset: &SourceOffset) -> Result<(), OffsetStoreError>;

    /// Clear the persisted offset so the engine resumes from the
    /// source-defined origin.
    fn reset(&self, name: &str, rev: &str) -> Result<(), OffsetStoreError>;
}
