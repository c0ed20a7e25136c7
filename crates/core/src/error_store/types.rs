//! Error buffer value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ingestion record as seen by the control plane.
///
/// The payload is opaque; the control plane only buffers and exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRecord {
    /// Record identifier assigned by the source.
    pub id: String,
    /// Where the record entered the pipeline (source stage instance).
    pub origin: String,
    /// Record payload.
    pub payload: serde_json::Value,
}

impl IngestRecord {
    pub fn new(id: impl Into<String>, origin: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            payload,
        }
    }
}

/// A record rejected by a stage, kept for operator inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Stage instance that rejected the record.
    pub stage_instance: String,
    /// The rejected record.
    pub record: IngestRecord,
    /// Why the stage rejected it.
    pub error: String,
    /// When the rejection happened.
    pub timestamp: DateTime<Utc>,
}

/// A stage-level error message not tied to a specific record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Stage instance that reported the error.
    pub stage_instance: String,
    /// The error message.
    pub message: String,
    /// When the error was reported.
    pub timestamp: DateTime<Utc>,
}

/// Aggregate view over all stages' buffers, served by the errors endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineErrors {
    pub records: Vec<ErrorRecord>,
    pub messages: Vec<ErrorMessage>,
}
