//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock execution engine injected, enabling comprehensive E2E
//! testing without external infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use rivulet_core::{
    testing::MockEngine, Config, DatabaseConfig, ErrorStore, InMemoryDefinitionStore,
    ManagerConfig, PipelineManager, SnapshotController, SqliteOffsetStore, SqliteSnapshotStore,
    SqliteStateStore,
};

/// Re-export fixtures for test convenience
pub use rivulet_core::testing::fixtures;

/// Test fixture for E2E testing with a mock engine.
///
/// Provides an in-process server with:
/// - MockEngine to script engine behavior
/// - InMemoryDefinitionStore to register pipeline definitions
/// - SQLite stores in a per-test temp directory
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start() {
///     let fixture = TestFixture::new().await;
///     fixture.definitions.insert(fixtures::definition("logs", "0"));
///
///     let response = fixture.post("/v1/pipeline/start?name=logs").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - script start/stop/capture behavior
    pub engine: Arc<MockEngine>,
    /// Definition store - register pipelines before starting them
    pub definitions: Arc<InMemoryDefinitionStore>,
    /// Temporary directory for the test database
    #[allow(dead_code)]
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default manager config.
    pub async fn new() -> Self {
        Self::with_manager_config(ManagerConfig {
            stop_timeout_secs: 1,
            persist_retry_backoff_ms: 10,
            ..ManagerConfig::default()
        })
        .await
    }

    /// Create a test fixture with custom manager configuration.
    pub async fn with_manager_config(manager_config: ManagerConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let engine = Arc::new(MockEngine::new());
        let definitions = Arc::new(InMemoryDefinitionStore::new());

        let state_store = Arc::new(
            SqliteStateStore::new(&db_path, manager_config.history_limit)
                .expect("Failed to create state store"),
        );
        let offset_store =
            Arc::new(SqliteOffsetStore::new(&db_path).expect("Failed to create offset store"));
        let snapshot_store =
            Arc::new(SqliteSnapshotStore::new(&db_path).expect("Failed to create snapshot store"));

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            manager: manager_config.clone(),
            ..Config::default()
        };

        let manager = Arc::new(PipelineManager::new(
            manager_config.clone(),
            engine.clone(),
            definitions.clone(),
            state_store,
            offset_store,
            Arc::new(ErrorStore::new(manager_config.error_capacity)),
            SnapshotController::new(snapshot_store),
        ));

        let state = Arc::new(rivulet_server::AppState::new(config, manager));
        let router = rivulet_server::create_router(state);

        Self {
            router,
            engine,
            definitions,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a PUT request.
    pub async fn put(&self, path: &str) -> TestResponse {
        self.request("PUT", path).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path).await
    }

    /// Send a GET request and return the raw body bytes.
    pub async fn get_bytes(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, body_bytes.to_vec())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
