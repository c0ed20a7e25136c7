pub mod config;
pub mod definition;
pub mod engine;
pub mod error_store;
pub mod lifecycle;
pub mod manager;
pub mod metrics;
pub mod offset;
pub mod snapshot;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ManagerConfig,
};
pub use definition::{
    DefinitionError, DefinitionStore, FsDefinitionStore, InMemoryDefinitionStore,
    PipelineDefinition, StageDef,
};
pub use engine::{EngineError, ExecutionEngine, MetricsSnapshot, NullEngine};
pub use error_store::{ErrorMessage, ErrorRecord, ErrorStore, IngestRecord, PipelineErrors};
pub use lifecycle::{PipelineState, SqliteStateStore, State, StateStore, StateStoreError};
pub use manager::{ManagerError, PipelineManager};
pub use offset::{OffsetStore, OffsetStoreError, SourceOffset, SqliteOffsetStore};
pub use snapshot::{
    SnapshotController, SnapshotError, SnapshotStatus, SnapshotStore, SqliteSnapshotStore,
};
