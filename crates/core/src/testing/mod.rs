//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides a controllable mock of the execution engine,
//! allowing full lifecycle testing without a real data plane.
//!
//! # Example
//!
//! ```rust,ignore
//! use rivulet_core::testing::{fixtures, MockEngine};
//!
//! let engine = MockEngine::new();
//! engine.set_capture_payload(b"[{\"id\":\"r1\"}]".to_vec());
//! engine.fail_stop("source hung");
//!
//! // Use in a PipelineManager...
//! ```

mod mock_engine;

pub use mock_engine::MockEngine;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::definition::{PipelineDefinition, StageDef};

    /// Create a test pipeline definition with reasonable defaults.
    pub fn definition(name: &str, rev: &str) -> PipelineDefinition {
        PipelineDefinition {
            name: name.to_string(),
            rev: rev.to_string(),
            description: format!("Test pipeline {}", name),
            stages: vec![
                StageDef {
                    instance_name: "source_1".to_string(),
                    stage_type: "dir-spooler".to_string(),
                },
                StageDef {
                    instance_name: "sink_1".to_string(),
                    stage_type: "trash".to_string(),
                },
            ],
        }
    }
}
