use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::ManagerConfig;
use crate::definition::{DefinitionError, DefinitionStore};
use crate::engine::{ExecutionEngine, MetricsSnapshot};
use crate::error_store::{ErrorMessage, ErrorRecord, ErrorStore, PipelineErrors};
use crate::lifecycle::{PipelineState, State, StateStore};
use crate::metrics::{MANAGER_OP_DURATION, STATE_TRANSITIONS};
use crate::offset::{OffsetStore, SourceOffset};
use crate::snapshot::{SnapshotController, SnapshotError, SnapshotStatus};

use super::types::ManagerError;

const MSG_NOT_RUNNING: &str = "Pipeline is not running";
const MSG_STOPPED: &str = "The pipeline is not running";
const MSG_RUNNING: &str = "The pipeline is now running";

/// Control plane for a single managed pipeline.
///
/// All lifecycle operations are serialized behind one operation lock,
/// so a caller never observes a transition half-applied. The engine
/// does the actual record processing; the manager owns state, offsets,
/// snapshots and error buffers around it.
pub struct PipelineManager {
    config: ManagerConfig,
    engine: Arc<dyn ExecutionEngine>,
    definitions: Arc<dyn DefinitionStore>,
    state_store: Arc<dyn StateStore>,
    offset_store: Arc<dyn OffsetStore>,
    error_store: Arc<ErrorStore>,
    snapshots: SnapshotController,
    current: RwLock<PipelineState>,
    op_lock: Mutex<()>,
}

impl PipelineManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ManagerConfig,
        engine: Arc<dyn ExecutionEngine>,
        definitions: Arc<dyn DefinitionStore>,
        state_store: Arc<dyn StateStore>,
        offset_store: Arc<dyn OffsetStore>,
        error_store: Arc<ErrorStore>,
        snapshots: SnapshotController,
    ) -> Self {
        let initial = PipelineState::new("", "0", State::Stopped, MSG_NOT_RUNNING);
        Self {
            config,
            engine,
            definitions,
            state_store,
            offset_store,
            error_store,
            snapshots,
            current: RwLock::new(initial),
            op_lock: Mutex::new(()),
        }
    }

    /// Current lifecycle state of the managed pipeline.
    pub async fn status(&self) -> PipelineState {
        self.current.read().await.clone()
    }

    /// Starts the pipeline identified by `name` and `rev`.
    ///
    /// Starting an already-running pipeline with the same identity is
    /// idempotent and returns the current state untouched.
    pub async fn start(&self, name: &str, rev: &str) -> Result<PipelineState, ManagerError> {
        if name.trim().is_empty() {
            return Err(ManagerError::Validation(
                "pipeline name must not be empty".to_string(),
            ));
        }

        let _guard = self.op_lock.lock().await;
        let timer = MANAGER_OP_DURATION.with_label_values(&["start"]).start_timer();

        let current = self.current.read().await.clone();
        match current.state {
            State::Running if current.name == name && current.rev == rev => {
                timer.observe_duration();
                return Ok(current);
            }
            State::Stopped | State::Error => {}
            state => return Err(ManagerError::invalid_state("start", state)),
        }

        let definition = self
            .definitions
            .get(name, rev)
            .map_err(|e| match e {
                DefinitionError::Malformed(msg) => ManagerError::Validation(msg),
                DefinitionError::Storage(msg) => ManagerError::Persistence(msg),
            })?
            .ok_or_else(|| ManagerError::NotFound(format!("pipeline '{name}' rev '{rev}'")))?;
        info!(
            name,
            rev,
            stages = definition.stages.len(),
            "Starting pipeline"
        );

        let offset = match self
            .with_retry("load offset", || self.offset_store.load(name, rev))
            .await
        {
            Ok(offset) => offset,
            Err(e) => {
                self.fail_to_error(name, rev, format!("Failed to load offset: {e}"))
                    .await;
                return Err(e);
            }
        };

        if let Err(e) = self.transition(name, rev, State::Starting, "Starting pipeline").await {
            self.fail_to_error(name, rev, format!("Failed to persist state: {e}"))
                .await;
            return Err(e);
        }

        match self.engine.start(offset).await {
            Ok(()) => {
                let state = self.transition(name, rev, State::Running, MSG_RUNNING).await;
                timer.observe_duration();
                match state {
                    Ok(state) => Ok(state),
                    Err(e) => {
                        self.fail_to_error(name, rev, format!("Failed to persist state: {e}"))
                            .await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                warn!(name, rev, "Engine failed to start: {e}");
                self.fail_to_error(name, rev, format!("Failed to start: {e}"))
                    .await;
                Err(ManagerError::Engine(e.to_string()))
            }
        }
    }

    /// Stops the pipeline, draining in-flight records first unless
    /// `bypass_graceful` is set. If the engine does not stop within the
    /// configured timeout it is killed and the stop is marked forced.
    ///
    /// Stopping an already-stopped pipeline is a no-op.
    pub async fn stop(&self, bypass_graceful: bool) -> Result<PipelineState, ManagerError> {
        let _guard = self.op_lock.lock().await;
        let timer = MANAGER_OP_DURATION.with_label_values(&["stop"]).start_timer();

        let current = self.current.read().await.clone();
        let from_error = match current.state {
            State::Stopped => {
                timer.observe_duration();
                return Ok(current);
            }
            State::Running => false,
            State::Error => true,
            state => return Err(ManagerError::invalid_state("stop", state)),
        };
        let (name, rev) = (current.name.clone(), current.rev.clone());

        if let Err(e) = self
            .transition(&name, &rev, State::Stopping, "Stopping pipeline")
            .await
        {
            self.fail_to_error(&name, &rev, format!("Failed to persist state: {e}"))
                .await;
            return Err(e);
        }

        let stop_timeout = Duration::from_secs(self.config.stop_timeout_secs);
        let mut forced = false;
        let final_offset = match tokio::time::timeout(
            stop_timeout,
            self.engine.stop(!bypass_graceful),
        )
        .await
        {
            Ok(Ok(offset)) => Some(offset),
            Ok(Err(e)) if from_error => {
                // The engine already failed; a stop error here is
                // expected and must not block reaching STOPPED.
                warn!(name, rev, "Engine stop failed while in ERROR state: {e}");
                None
            }
            Ok(Err(e)) => {
                self.fail_to_error(&name, &rev, format!("Failed to stop: {e}"))
                    .await;
                return Err(ManagerError::Engine(e.to_string()));
            }
            Err(_) => {
                warn!(
                    name,
                    rev,
                    timeout_secs = self.config.stop_timeout_secs,
                    "Engine did not stop within drain timeout, killing it"
                );
                forced = true;
                Some(self.engine.kill().await)
            }
        };

        // The offset must be durable before the pipeline reports
        // STOPPED, otherwise a restart could replay or skip records.
        if let Some(offset) = final_offset {
            if let Err(e) = self
                .with_retry("save offset", || self.offset_store.save(&name, &rev, &offset))
                .await
            {
                self.fail_to_error(&name, &rev, format!("Failed to persist offset: {e}"))
                    .await;
                return Err(e);
            }
        }

        let message = if forced {
            format!("{MSG_STOPPED} (force-terminated after drain timeout)")
        } else {
            MSG_STOPPED.to_string()
        };
        let state = self.transition(&name, &rev, State::Stopped, &message).await;
        timer.observe_duration();
        match state {
            Ok(state) => {
                info!(name, rev, forced, "Pipeline stopped");
                Ok(state)
            }
            Err(e) => {
                self.fail_to_error(&name, &rev, format!("Failed to persist state: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    /// Committed source offset of the managed pipeline, if any.
    pub async fn get_offset(&self) -> Result<Option<SourceOffset>, ManagerError> {
        let current = self.current.read().await.clone();
        if current.name.is_empty() {
            return Ok(None);
        }
        self.offset_store
            .load(&current.name, &current.rev)
            .map_err(|e| ManagerError::Persistence(e.to_string()))
    }

    /// Overwrites the committed offset. Only allowed while stopped, so
    /// the engine never races a manual rewind.
    pub async fn set_offset(&self, offset: &str) -> Result<(), ManagerError> {
        let _guard = self.op_lock.lock().await;
        let current = self.current.read().await.clone();
        if current.state != State::Stopped {
            return Err(ManagerError::invalid_state("set offset", current.state));
        }
        if current.name.is_empty() {
            return Err(ManagerError::Conflict(
                "no pipeline has been run yet".to_string(),
            ));
        }
        let offset = SourceOffset::new(offset);
        self.with_retry("save offset", || {
            self.offset_store.save(&current.name, &current.rev, &offset)
        })
        .await
    }

    /// Deletes the committed offset for `name`/`rev`, making the next
    /// start read from the beginning.
    pub async fn reset_offset(&self, name: &str, rev: &str) -> Result<(), ManagerError> {
        let _guard = self.op_lock.lock().await;
        let current = self.current.read().await.clone();
        if current.name == name && current.state != State::Stopped {
            return Err(ManagerError::invalid_state("reset offset", current.state));
        }
        self.with_retry("reset offset", || self.offset_store.reset(name, rev))
            .await
    }

    /// Lifecycle history for `name`/`rev`, oldest first.
    pub async fn history(&self, name: &str, rev: &str) -> Result<Vec<PipelineState>, ManagerError> {
        self.state_store
            .history(name, rev)
            .map_err(|e| ManagerError::Persistence(e.to_string()))
    }

    /// Removes the persisted lifecycle history for `name`/`rev`. The
    /// current state is untouched.
    pub async fn clear_history(&self, name: &str, rev: &str) -> Result<(), ManagerError> {
        let _guard = self.op_lock.lock().await;
        self.with_retry("clear history", || self.state_store.clear_history(name, rev))
            .await
    }

    /// Live engine metrics. Empty unless the pipeline is running.
    pub async fn metrics(&self) -> MetricsSnapshot {
        let current = self.current.read().await;
        if current.state == State::Running {
            self.engine.metrics()
        } else {
            MetricsSnapshot::empty()
        }
    }

    /// Requests an asynchronous snapshot capture of the next batch.
    pub async fn capture_snapshot(&self) -> Result<(), ManagerError> {
        let current = self.current.read().await.clone();
        if current.state != State::Running {
            return Err(ManagerError::invalid_state("capture snapshot", current.state));
        }
        self.snapshots
            .request(self.engine.clone(), &current.name, &current.rev)
            .map_err(Self::map_snapshot_err)
    }

    pub async fn snapshot_status(&self) -> Result<SnapshotStatus, ManagerError> {
        let current = self.current.read().await.clone();
        self.snapshots
            .status(&current.name, &self.rev_for(&current, &current.name))
            .map_err(Self::map_snapshot_err)
    }

    /// Stored snapshot payload for `name`, if one has been captured.
    /// Without an explicit `rev` the current identity's revision is
    /// used when the name matches, otherwise "0".
    pub async fn snapshot(
        &self,
        name: &str,
        rev: Option<&str>,
    ) -> Result<Option<Vec<u8>>, ManagerError> {
        let rev = self.resolve_rev(name, rev).await;
        self.snapshots.get(name, &rev).map_err(Self::map_snapshot_err)
    }

    pub async fn delete_snapshot(&self, name: &str, rev: Option<&str>) -> Result<(), ManagerError> {
        let rev = self.resolve_rev(name, rev).await;
        self.snapshots
            .delete(name, &rev)
            .map_err(Self::map_snapshot_err)
    }

    /// Buffered error records and messages across all stages.
    pub async fn errors(&self) -> PipelineErrors {
        self.error_store.all().await
    }

    pub async fn clear_errors(&self) {
        self.error_store.clear().await;
    }

    /// Most recent error records for one stage instance.
    pub async fn error_records(&self, stage_instance: &str) -> Vec<ErrorRecord> {
        self.error_store.records(stage_instance).await
    }

    /// Most recent error messages for one stage instance.
    pub async fn error_messages(&self, stage_instance: &str) -> Vec<ErrorMessage> {
        self.error_store.messages(stage_instance).await
    }

    /// The error buffers the engine reports into.
    pub fn error_store(&self) -> Arc<ErrorStore> {
        self.error_store.clone()
    }

    async fn resolve_rev(&self, name: &str, rev: Option<&str>) -> String {
        match rev {
            Some(rev) => rev.to_string(),
            None => {
                let current = self.current.read().await.clone();
                self.rev_for(&current, name)
            }
        }
    }

    fn rev_for(&self, current: &PipelineState, name: &str) -> String {
        if current.name == name {
            current.rev.clone()
        } else {
            "0".to_string()
        }
    }

    fn map_snapshot_err(err: SnapshotError) -> ManagerError {
        match err {
            SnapshotError::CaptureInProgress => {
                ManagerError::Conflict("Snapshot capture already in progress".to_string())
            }
            SnapshotError::Database(msg) => ManagerError::Persistence(msg),
        }
    }

    /// Applies a state transition and persists the new state. History
    /// is appended by the store as part of the same save.
    async fn transition(
        &self,
        name: &str,
        rev: &str,
        state: State,
        message: &str,
    ) -> Result<PipelineState, ManagerError> {
        let next = PipelineState::new(name, rev, state, message);
        let from = {
            let mut current = self.current.write().await;
            let from = current.state;
            *current = next.clone();
            from
        };
        STATE_TRANSITIONS
            .with_label_values(&[from.as_str(), state.as_str()])
            .inc();
        self.with_retry("persist pipeline state", || self.state_store.save(&next))
            .await?;
        Ok(next)
    }

    /// Moves the pipeline to ERROR with a best-effort persist. Used
    /// when an operation already failed and a second persistence
    /// failure must not mask the original error.
    async fn fail_to_error(&self, name: &str, rev: &str, message: String) {
        let next = PipelineState::new(name, rev, State::Error, &message);
        let from = {
            let mut current = self.current.write().await;
            let from = current.state;
            *current = next.clone();
            from
        };
        STATE_TRANSITIONS
            .with_label_values(&[from.as_str(), State::Error.as_str()])
            .inc();
        if let Err(e) = self.state_store.save(&next) {
            warn!(name, rev, "Failed to persist ERROR state: {e}");
        }
    }

    /// Runs a store operation, retrying once after a short backoff
    /// before giving up.
    async fn with_retry<T, E, F>(&self, what: &str, f: F) -> Result<T, ManagerError>
    where
        E: Display,
        F: Fn() -> Result<T, E>,
    {
        match f() {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("{what} failed, retrying once: {e}");
                tokio::time::sleep(Duration::from_millis(self.config.persist_retry_backoff_ms))
                    .await;
                f().map_err(|e| ManagerError::Persistence(format!("{what}: {e}")))
            }
        }
    }
}
