//! Pipeline lifecycle value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Not executing. Initial state.
    Stopped,
    /// Engine start requested, not yet confirmed.
    Starting,
    /// Engine is processing records.
    Running,
    /// Engine halt requested, draining.
    Stopping,
    /// Unrecoverable engine or persistence failure. Cleared only by an
    /// explicit start or stop.
    Error,
}

impl State {
    /// Every state, for exhaustive gauge labelling.
    pub const ALL: &'static [State] = &[
        State::Stopped,
        State::Starting,
        State::Running,
        State::Stopping,
        State::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Stopped => "STOPPED",
            State::Starting => "STARTING",
            State::Running => "RUNNING",
            State::Stopping => "STOPPING",
            State::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of a pipeline's lifecycle at a point in time.
///
/// A new instance is created on every transition; exactly one current
/// `PipelineState` exists per (name, rev) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Pipeline name.
    pub name: String,
    /// Pipeline configuration revision.
    pub rev: String,
    /// Current lifecycle state.
    pub state: State,
    /// Human-readable detail for the transition.
    pub message: String,
    /// When the transition was committed.
    pub timestamp: DateTime<Utc>,
}

impl PipelineState {
    pub fn new(
        name: impl Into<String>,
        rev: impl Into<String>,
        state: State,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rev: rev.into(),
            state,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&State::Stopped).unwrap(), "\"STOPPED\"");
        assert_eq!(serde_json::to_string(&State::Running).unwrap(), "\"RUNNING\"");
    }

    #[test]
    fn test_pipeline_state_roundtrip() {
        let state = PipelineState::new("orders", "2.0", State::Running, "The pipeline is now running");
        let json = serde_json::to_string(&state).unwrap();
        let parsed: PipelineState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
