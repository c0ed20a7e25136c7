//! Engine error and metrics types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error type for execution engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine failed to start processing.
    #[error("Engine failed to start: {0}")]
    StartFailed(String),

    /// The engine failed to halt cleanly.
    #[error("Engine failed to stop: {0}")]
    StopFailed(String),

    /// The stream tap could not produce a capture.
    #[error("Stream capture failed: {0}")]
    CaptureFailed(String),
}

/// Read-only snapshot of the counters and gauges the engine maintains.
///
/// Keys are metric names; the map is ordered so serialized output is
/// stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot(pub BTreeMap<String, f64>);

impl MetricsSnapshot {
    /// Empty snapshot, returned while the pipeline is not running.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsSnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "{}");
    }

    #[test]
    fn test_snapshot_set_get() {
        let mut snapshot = MetricsSnapshot::empty();
        snapshot.set("records.processed", 42.0);
        assert_eq!(snapshot.get("records.processed"), Some(42.0));
        assert_eq!(snapshot.get("missing"), None);
    }
}
