use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot capture already in progress")]
    CaptureInProgress,
    #[error("Database error: {0}")]
    Database(String),
}

/// Externally visible capture state for one pipeline's snapshot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    pub exists: bool,
    pub in_progress: bool,
}
