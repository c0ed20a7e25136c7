use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rivulet_core::{
    load_config, validate_config, Config, ErrorStore, ExecutionEngine, NullEngine,
    FsDefinitionStore, PipelineManager, SnapshotController, SqliteOffsetStore,
    SqliteSnapshotStore, SqliteStateStore, State,
};

use rivulet_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Rivulet {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("RIVULET_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration, defaulting everything when no file exists
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Database path: {:?}", config.database.path);
    info!("Definitions dir: {:?}", config.definitions.dir);

    // Create SQLite-backed stores on the shared database
    let state_store = Arc::new(
        SqliteStateStore::new(&config.database.path, config.manager.history_limit)
            .context("Failed to create state store")?,
    );
    let offset_store = Arc::new(
        SqliteOffsetStore::new(&config.database.path).context("Failed to create offset store")?,
    );
    let snapshot_store = Arc::new(
        SqliteSnapshotStore::new(&config.database.path)
            .context("Failed to create snapshot store")?,
    );
    info!("Stores initialized");

    // Definition files live on disk so operators can edit them directly
    let definitions = Arc::new(FsDefinitionStore::new(&config.definitions.dir));

    // No real data plane is embedded yet; the null engine accepts every
    // command so the control plane can run standalone
    let engine: Arc<dyn ExecutionEngine> = Arc::new(NullEngine::new());

    let manager = Arc::new(PipelineManager::new(
        config.manager.clone(),
        engine,
        definitions,
        state_store,
        offset_store,
        Arc::new(ErrorStore::new(config.manager.error_capacity)),
        SnapshotController::new(snapshot_store),
    ));

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), manager.clone()));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the pipeline so the final offset is committed before exit
    info!("Server shutting down...");
    if manager.status().await.state == State::Running {
        info!("Stopping running pipeline...");
        if let Err(e) = manager.stop(false).await {
            error!("Failed to stop pipeline during shutdown: {}", e);
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
