use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware, pipeline};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Lifecycle
        .route("/pipeline/status", get(pipeline::status))
        .route("/pipeline/start", post(pipeline::start))
        .route("/pipeline/stop", post(pipeline::stop))
        // Offsets
        .route(
            "/pipeline/offset",
            get(pipeline::get_offset).post(pipeline::set_offset),
        )
        .route("/pipeline/resetOffset/{name}", post(pipeline::reset_offset))
        // Snapshots
        .route(
            "/pipeline/snapshot",
            put(pipeline::capture_snapshot).get(pipeline::snapshot_status),
        )
        .route(
            "/pipeline/snapshot/{name}",
            get(pipeline::get_snapshot).delete(pipeline::delete_snapshot),
        )
        // Metrics, history and errors
        .route("/pipeline/metrics", get(pipeline::pipeline_metrics))
        .route(
            "/pipeline/history/{name}",
            get(pipeline::history).delete(pipeline::clear_history),
        )
        .route(
            "/pipeline/errors/{name}",
            get(pipeline::errors).delete(pipeline::clear_errors),
        )
        .route("/pipeline/errorRecords", get(pipeline::error_records))
        .route("/pipeline/errorMessages", get(pipeline::error_messages))
        .with_state(state.clone());

    Router::new()
        .nest("/v1", api_routes)
        .route(
            "/metrics",
            get(handlers::prometheus_metrics).with_state(state),
        )
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
