//! No-op engine for development deployments.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::offset::SourceOffset;

use super::traits::ExecutionEngine;
use super::types::{EngineError, MetricsSnapshot};

/// Engine that accepts every lifecycle command without processing any
/// records. Lets the control plane run standalone until a real engine
/// is wired in at the embedding site.
#[derive(Default)]
pub struct NullEngine {
    running: AtomicBool,
    offset: RwLock<Option<SourceOffset>>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionEngine for NullEngine {
    async fn start(&self, offset: Option<SourceOffset>) -> Result<(), EngineError> {
        *self.offset.write().await = offset;
        self.running.store(true, Ordering::SeqCst);
        info!("Null engine started");
        Ok(())
    }

    async fn stop(&self, _graceful: bool) -> Result<SourceOffset, EngineError> {
        self.running.store(false, Ordering::SeqCst);
        info!("Null engine stopped");
        Ok(self
            .offset
            .read()
            .await
            .clone()
            .unwrap_or_else(|| SourceOffset::new("")))
    }

    async fn kill(&self) -> SourceOffset {
        self.running.store(false, Ordering::SeqCst);
        self.offset
            .read()
            .await
            .clone()
            .unwrap_or_else(|| SourceOffset::new(""))
    }

    async fn capture_batch(&self) -> Result<Vec<u8>, EngineError> {
        Ok(b"[]".to_vec())
    }

    fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_returns_start_offset() {
        let engine = NullEngine::new();
        engine
            .start(Some(SourceOffset::new("file:42")))
            .await
            .unwrap();

        let offset = engine.stop(true).await.unwrap();
        assert_eq!(offset.offset, "file:42");
    }

    #[tokio::test]
    async fn test_capture_is_empty_batch() {
        let engine = NullEngine::new();
        assert_eq!(engine.capture_batch().await.unwrap(), b"[]");
    }
}
