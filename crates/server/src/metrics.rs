//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Rivulet server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Pipeline state gauges (collected dynamically)
//! - Engine metrics mirrored as gauges while the pipeline runs

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rivulet_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rivulet_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "rivulet_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics (collected dynamically)
// =============================================================================

/// Pipeline state as a one-hot gauge by state label.
pub static PIPELINE_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "rivulet_pipeline_state",
            "Current pipeline state (1 for the active state, 0 otherwise)",
        ),
        &["state"],
    )
    .unwrap()
});

/// Pipeline running state (1 = running, 0 = not running).
pub static PIPELINE_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "rivulet_pipeline_running",
        "Whether the pipeline is running (1) or not (0)",
    )
    .unwrap()
});

/// Engine metrics mirrored by name while the pipeline runs.
pub static ENGINE_METRICS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new(
            "rivulet_engine_metric",
            "Engine-reported metric values by name",
        ),
        &["name"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Pipeline
    registry.register(Box::new(PIPELINE_STATE.clone())).unwrap();
    registry
        .register(Box::new(PIPELINE_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(ENGINE_METRICS.clone())).unwrap();

    // Core metrics (lifecycle, snapshots, error buffers)
    for metric in rivulet_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding metrics to update gauges with the current
/// pipeline state and the engine's live counters.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.manager().status().await;
    for s in rivulet_core::State::ALL {
        PIPELINE_STATE
            .with_label_values(&[s.as_str()])
            .set(if *s == status.state { 1 } else { 0 });
    }
    PIPELINE_RUNNING.set(if status.state == rivulet_core::State::Running {
        1
    } else {
        0
    });

    let snapshot = state.manager().metrics().await;
    for (name, value) in &snapshot.0 {
        ENGINE_METRICS.with_label_values(&[name]).set(*value);
    }
}

/// Normalize a path for metric labels (replace pipeline names with placeholders).
pub fn normalize_path(path: &str) -> String {
    let name_regex =
        regex_lite::Regex::new(r"/(snapshot|history|errors|resetOffset)/[^/]+").unwrap();
    name_regex.replace_all(path, "/$1/{name}").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_pipeline_name() {
        let path = "/v1/pipeline/history/my-pipeline";
        assert_eq!(normalize_path(path), "/v1/pipeline/history/{name}");
    }

    #[test]
    fn test_normalize_path_snapshot() {
        let path = "/v1/pipeline/snapshot/logs";
        assert_eq!(normalize_path(path), "/v1/pipeline/snapshot/{name}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/v1/health";
        assert_eq!(normalize_path(path), "/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("rivulet_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_pipeline_gauges() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        PIPELINE_STATE.with_label_values(&["STOPPED"]).set(1);
        PIPELINE_RUNNING.set(0);
        ENGINE_METRICS.with_label_values(&["records_processed"]).set(0.0);

        let output = encode_metrics();
        assert!(output.contains("rivulet_http_request_duration_seconds"));
        assert!(output.contains("rivulet_pipeline_state"));
        assert!(output.contains("rivulet_pipeline_running"));
        assert!(output.contains("rivulet_engine_metric"));
    }
}
