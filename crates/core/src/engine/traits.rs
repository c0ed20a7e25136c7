//! Execution engine abstraction.

use async_trait::async_trait;

use crate::offset::SourceOffset;

use super::types::{EngineError, MetricsSnapshot};

/// The record-processing execution engine driven by the manager.
///
/// The engine reads, transforms and writes records through the
/// configured stages; the control plane only starts/stops it and
/// queries it for offsets, captures and metrics. Implementations are
/// supplied externally and injected at manager construction.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Start processing from `offset`, or from the source-defined
    /// origin when `None`. Resolves once the engine is running.
    async fn start(&self, offset: Option<SourceOffset>) -> Result<(), EngineError>;

    /// Halt processing and return the last offset acknowledged as
    /// durably consumed. `graceful` drains in-flight records first.
    async fn stop(&self, graceful: bool) -> Result<SourceOffset, EngineError>;

    /// Force-terminate the engine after a drain timeout. Returns the
    /// last acknowledged offset; never fails.
    async fn kill(&self) -> SourceOffset;

    /// Tap the record stream until one full batch has been observed and
    /// return it serialized. Used for point-in-time snapshot capture.
    async fn capture_batch(&self) -> Result<Vec<u8>, EngineError>;

    /// Current engine-maintained counters and gauges.
    fn metrics(&self) -> MetricsSnapshot;
}
