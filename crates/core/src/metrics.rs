//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Lifecycle (state transitions, manager operation latency)
//! - Snapshots (capture outcomes)
//! - Error buffers (evictions)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// State transitions total by from/to state.
pub static STATE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rivulet_state_transitions_total",
            "Total pipeline state transitions",
        ),
        &["from", "to"],
    )
    .unwrap()
});

/// Manager operation duration in seconds.
pub static MANAGER_OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rivulet_manager_op_duration_seconds",
            "Duration of pipeline manager operations",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 60.0]),
        &["op"], // "start", "stop"
    )
    .unwrap()
});

/// Snapshot captures total by result.
pub static SNAPSHOT_CAPTURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rivulet_snapshot_captures_total",
            "Total snapshot capture attempts",
        ),
        &["result"], // "ok", "failed", "stale"
    )
    .unwrap()
});

/// Error buffer evictions total by kind.
pub static ERROR_BUFFER_EVICTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rivulet_error_buffer_evictions_total",
            "Total entries evicted from bounded error buffers",
        ),
        &["kind"], // "record", "message"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(STATE_TRANSITIONS.clone()),
        Box::new(MANAGER_OP_DURATION.clone()),
        Box::new(SNAPSHOT_CAPTURES.clone()),
        Box::new(ERROR_BUFFER_EVICTIONS.clone()),
    ]
}
