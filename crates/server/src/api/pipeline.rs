//! Pipeline API handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use rivulet_core::{
    ErrorMessage, ErrorRecord, ManagerError, MetricsSnapshot, PipelineErrors, PipelineState,
    SnapshotStatus, SourceOffset,
};

use crate::state::AppState;

fn default_rev() -> String {
    "0".to_string()
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for starting a pipeline
#[derive(Debug, Deserialize)]
pub struct StartParams {
    /// Pipeline name
    pub name: String,
    /// Pipeline revision (default "0")
    #[serde(default = "default_rev")]
    pub rev: String,
}

/// Query parameters for stopping the pipeline
#[derive(Debug, Deserialize)]
pub struct StopParams {
    /// Accepted for symmetry with start; the manager runs one pipeline
    /// so the revision does not select anything.
    #[allow(dead_code)]
    pub rev: Option<String>,
    /// Skip graceful draining and halt the engine immediately
    #[serde(default)]
    pub force: bool,
}

/// Query parameters for committing an offset
#[derive(Debug, Deserialize)]
pub struct OffsetParams {
    pub offset: String,
}

/// Query parameters carrying an optional revision
#[derive(Debug, Deserialize)]
pub struct RevParams {
    #[serde(default = "default_rev")]
    pub rev: String,
}

/// Optional revision override for the per-name snapshot endpoints.
/// When absent the manager resolves against the current identity.
#[derive(Debug, Deserialize)]
pub struct SnapshotRevParams {
    pub rev: Option<String>,
}

/// Query parameters for the snapshot collection endpoint
#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    /// Only "status" is recognized; present for wire compatibility
    #[allow(dead_code)]
    pub get: Option<String>,
}

/// Query parameters selecting a stage instance
#[derive(Debug, Deserialize)]
pub struct StageParams {
    #[serde(rename = "stageInstanceName")]
    pub stage_instance_name: String,
}

/// Error body returned by every pipeline endpoint
#[derive(Debug, Serialize)]
pub struct PipelineErrorResponse {
    pub error: String,
}

fn error_response(err: ManagerError) -> (StatusCode, Json<PipelineErrorResponse>) {
    let status = match &err {
        ManagerError::Validation(_) => StatusCode::BAD_REQUEST,
        ManagerError::NotFound(_) => StatusCode::NOT_FOUND,
        ManagerError::InvalidState { .. } | ManagerError::Conflict(_) => StatusCode::CONFLICT,
        ManagerError::Persistence(_) | ManagerError::Engine(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(PipelineErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Current pipeline state
pub async fn status(State(state): State<Arc<AppState>>) -> Json<PipelineState> {
    Json(state.manager().status().await)
}

/// Start the pipeline identified by name and revision
pub async fn start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartParams>,
) -> Result<Json<PipelineState>, impl IntoResponse> {
    state
        .manager()
        .start(&params.name, &params.rev)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Stop the pipeline, optionally bypassing graceful draining
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StopParams>,
) -> Result<Json<PipelineState>, impl IntoResponse> {
    state
        .manager()
        .stop(params.force)
        .await
        .map(Json)
        .map_err(error_response)
}

// ============================================================================
// Offsets
// ============================================================================

/// Committed source offset, 204 when none exists
pub async fn get_offset(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<PipelineErrorResponse>)> {
    match state.manager().get_offset().await {
        Ok(Some(offset)) => Ok(Json(offset).into_response()),
        Ok(None) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(error_response(e)),
    }
}

/// Overwrite the committed offset (pipeline must be stopped)
pub async fn set_offset(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OffsetParams>,
) -> Result<Json<SourceOffset>, impl IntoResponse> {
    state
        .manager()
        .set_offset(&params.offset)
        .await
        .map(|_| Json(SourceOffset::new(&params.offset)))
        .map_err(error_response)
}

/// Delete the committed offset for a pipeline revision
pub async fn reset_offset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<RevParams>,
) -> Result<StatusCode, impl IntoResponse> {
    state
        .manager()
        .reset_offset(&name, &params.rev)
        .await
        .map(|_| StatusCode::OK)
        .map_err(error_response)
}

// ============================================================================
// Snapshots
// ============================================================================

/// Kick off an asynchronous snapshot capture
pub async fn capture_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, impl IntoResponse> {
    state
        .manager()
        .capture_snapshot()
        .await
        .map(|_| StatusCode::OK)
        .map_err(error_response)
}

/// Capture status of the snapshot slot
pub async fn snapshot_status(
    State(state): State<Arc<AppState>>,
    Query(_params): Query<SnapshotQuery>,
) -> Result<Json<SnapshotStatus>, impl IntoResponse> {
    state
        .manager()
        .snapshot_status()
        .await
        .map(Json)
        .map_err(error_response)
}

/// Stored snapshot payload, 204 when none has been captured
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<SnapshotRevParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<PipelineErrorResponse>)> {
    match state.manager().snapshot(&name, params.rev.as_deref()).await {
        Ok(Some(payload)) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            payload,
        )
            .into_response()),
        Ok(None) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(error_response(e)),
    }
}

/// Delete the stored snapshot
pub async fn delete_snapshot(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<SnapshotRevParams>,
) -> Result<StatusCode, impl IntoResponse> {
    state
        .manager()
        .delete_snapshot(&name, params.rev.as_deref())
        .await
        .map(|_| StatusCode::OK)
        .map_err(error_response)
}

// ============================================================================
// Metrics, history and errors
// ============================================================================

/// Live engine metrics (empty object unless running)
pub async fn pipeline_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.manager().metrics().await)
}

/// Lifecycle history for a pipeline revision, oldest first
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<RevParams>,
) -> Result<Json<Vec<PipelineState>>, impl IntoResponse> {
    state
        .manager()
        .history(&name, &params.rev)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Clear the lifecycle history for a pipeline revision
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<RevParams>,
) -> Result<StatusCode, impl IntoResponse> {
    state
        .manager()
        .clear_history(&name, &params.rev)
        .await
        .map(|_| StatusCode::OK)
        .map_err(error_response)
}

/// Buffered error records and messages across all stages
pub async fn errors(
    State(state): State<Arc<AppState>>,
    Path(_name): Path<String>,
) -> Json<PipelineErrors> {
    Json(state.manager().errors().await)
}

/// Clear all buffered errors
pub async fn clear_errors(
    State(state): State<Arc<AppState>>,
    Path(_name): Path<String>,
) -> StatusCode {
    state.manager().clear_errors().await;
    StatusCode::OK
}

/// Most recent error records for one stage instance
pub async fn error_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StageParams>,
) -> Json<Vec<ErrorRecord>> {
    Json(
        state
            .manager()
            .error_records(&params.stage_instance_name)
            .await,
    )
}

/// Most recent error messages for one stage instance
pub async fn error_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StageParams>,
) -> Json<Vec<ErrorMessage>> {
    Json(
        state
            .manager()
            .error_messages(&params.stage_instance_name)
            .await,
    )
}
