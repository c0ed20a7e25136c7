//! State storage trait.

use super::PipelineState;

/// Error type for state store operations.
#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Persistence for the current pipeline state and its bounded history.
///
/// `save` must commit the current state and the history append atomically:
/// a crash between the two must never leave history ahead of the current
/// state or vice versa.
pub trait StateStore: Send + Sync {
    /// Get the current persisted state for a pipeline, if any.
    fn current(&self, name: &str, rev: &str) -> Result<Option<PipelineState>, StateStoreError>;

    /// Persist a new current state and append it to the history,
    /// evicting the oldest entries beyond the configured bound.
    fn save(&self, state: &PipelineState) -> Result<(), StateStoreError>;

    /// List past states for a pipeline in commit order, oldest first.
    fn history(&self, name: &str, rev: &str) -> Result<Vec<PipelineState>, StateStoreError>;

    /// Remove all history entries for a pipeline.
    fn clear_history(&self, name: &str, rev: &str) -> Result<(), StateStoreError>;
}
