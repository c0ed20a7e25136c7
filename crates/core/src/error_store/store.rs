//! In-memory bounded error buffers.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::metrics::ERROR_BUFFER_EVICTIONS;

use super::types::{ErrorMessage, ErrorRecord, IngestRecord, PipelineErrors};

/// Fixed-capacity ring buffers of error records and error messages,
/// one pair per stage-instance-name.
///
/// Insertion from the engine is the only mutation path other than
/// `clear`; inserting beyond capacity evicts the oldest entry (FIFO).
pub struct ErrorStore {
    capacity: usize,
    records: RwLock<HashMap<String, VecDeque<ErrorRecord>>>,
    messages: RwLock<HashMap<String, VecDeque<ErrorMessage>>>,
}

impl ErrorStore {
    /// Create a store with per-stage buffer capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
        }
    }

    /// Buffer a rejected record for a stage, evicting the oldest entry
    /// when the stage's buffer is full.
    pub async fn push_record(
        &self,
        stage_instance: impl Into<String>,
        record: IngestRecord,
        error: impl Into<String>,
    ) {
        let stage_instance = stage_instance.into();
        let entry = ErrorRecord {
            stage_instance: stage_instance.clone(),
            record,
            error: error.into(),
            timestamp: Utc::now(),
        };

        let mut records = self.records.write().await;
        let ring = records.entry(stage_instance).or_default();
        if ring.len() >= self.capacity {
            ring.pop_front();
            ERROR_BUFFER_EVICTIONS.with_label_values(&["record"]).inc();
        }
        ring.push_back(entry);
    }

    /// Buffer a stage error message, evicting the oldest when full.
    pub async fn push_message(
        &self,
        stage_instance: impl Into<String>,
        message: impl Into<String>,
    ) {
        let stage_instance = stage_instance.into();
        let entry = ErrorMessage {
            stage_instance: stage_instance.clone(),
            message: message.into(),
            timestamp: Utc::now(),
        };

        let mut messages = self.messages.write().await;
        let ring = messages.entry(stage_instance).or_default();
        if ring.len() >= self.capacity {
            ring.pop_front();
            ERROR_BUFFER_EVICTIONS.with_label_values(&["message"]).inc();
        }
        ring.push_back(entry);
    }

    /// Error records for a stage in arrival order. Unknown stages have
    /// an empty buffer.
    pub async fn records(&self, stage_instance: &str) -> Vec<ErrorRecord> {
        self.records
            .read()
            .await
            .get(stage_instance)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Error messages for a stage in arrival order.
    pub async fn messages(&self, stage_instance: &str) -> Vec<ErrorMessage> {
        self.messages
            .read()
            .await
            .get(stage_instance)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Aggregate view over every stage's buffers.
    pub async fn all(&self) -> PipelineErrors {
        let records = self.records.read().await;
        let messages = self.messages.read().await;

        let mut all_records: Vec<ErrorRecord> = records
            .values()
            .flat_map(|ring| ring.iter().cloned())
            .collect();
        let mut all_messages: Vec<ErrorMessage> = messages
            .values()
            .flat_map(|ring| ring.iter().cloned())
            .collect();

        all_records.sort_by_key(|r| r.timestamp);
        all_messages.sort_by_key(|m| m.timestamp);

        PipelineErrors {
            records: all_records,
            messages: all_messages,
        }
    }

    /// Clear all stages' buffers.
    pub async fn clear(&self) {
        self.records.write().await.clear();
        self.messages.write().await.clear();
    }
}
