//! Mock execution engine for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::engine::{EngineError, ExecutionEngine, MetricsSnapshot};
use crate::offset::SourceOffset;

/// Mock implementation of the ExecutionEngine trait.
///
/// Provides controllable behavior for testing:
/// - Record the offsets it was started with, for assertions
/// - Script start/stop/capture failures
/// - Delay stop or capture to exercise timeouts and in-progress flags
/// - Serve a canned snapshot payload, final offset and metrics
#[derive(Default)]
pub struct MockEngine {
    running: AtomicBool,
    /// Offsets passed to start(), in call order.
    started_with: RwLock<Vec<Option<SourceOffset>>>,
    /// Offset returned by stop() and kill().
    final_offset: RwLock<Option<SourceOffset>>,
    fail_start: RwLock<Option<String>>,
    fail_stop: RwLock<Option<String>>,
    fail_capture: RwLock<Option<String>>,
    capture_payload: RwLock<Vec<u8>>,
    capture_delay: RwLock<Option<Duration>>,
    stop_delay: RwLock<Option<Duration>>,
    metrics: RwLock<MetricsSnapshot>,
}

impl MockEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        engine.set_capture_payload(b"[]".to_vec());
        engine
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn started_with(&self) -> Vec<Option<SourceOffset>> {
        self.read(&self.started_with)
    }

    pub fn set_final_offset(&self, offset: &str) {
        self.write(&self.final_offset, Some(SourceOffset::new(offset)));
    }

    pub fn fail_start(&self, reason: &str) {
        self.write(&self.fail_start, Some(reason.to_string()));
    }

    pub fn fail_stop(&self, reason: &str) {
        self.write(&self.fail_stop, Some(reason.to_string()));
    }

    pub fn fail_capture(&self, reason: &str) {
        self.write(&self.fail_capture, Some(reason.to_string()));
    }

    /// Clears any scripted failures so later calls succeed again.
    pub fn clear_failures(&self) {
        self.write(&self.fail_start, None);
        self.write(&self.fail_stop, None);
        self.write(&self.fail_capture, None);
    }

    pub fn set_capture_payload(&self, payload: Vec<u8>) {
        self.write(&self.capture_payload, payload);
    }

    pub fn set_capture_delay(&self, delay: Duration) {
        self.write(&self.capture_delay, Some(delay));
    }

    /// Makes stop() hang for `delay`, letting tests trigger the drain
    /// timeout and forced kill path.
    pub fn set_stop_delay(&self, delay: Duration) {
        self.write(&self.stop_delay, Some(delay));
    }

    pub fn set_metrics(&self, metrics: MetricsSnapshot) {
        self.write(&self.metrics, metrics);
    }

    fn read<T: Clone>(&self, lock: &RwLock<T>) -> T {
        lock.read().map(|v| v.clone()).unwrap_or_else(|e| e.into_inner().clone())
    }

    fn write<T>(&self, lock: &RwLock<T>, value: T) {
        match lock.write() {
            Ok(mut guard) => *guard = value,
            Err(e) => *e.into_inner() = value,
        }
    }

    fn final_offset_or_empty(&self) -> SourceOffset {
        self.read(&self.final_offset)
            .unwrap_or_else(|| SourceOffset::new(""))
    }
}

#[async_trait]
impl ExecutionEngine for MockEngine {
    async fn start(&self, offset: Option<SourceOffset>) -> Result<(), EngineError> {
        if let Some(reason) = self.read(&self.fail_start) {
            return Err(EngineError::StartFailed(reason));
        }
        if let Ok(mut started) = self.started_with.write() {
            started.push(offset);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _graceful: bool) -> Result<SourceOffset, EngineError> {
        if let Some(delay) = self.read(&self.stop_delay) {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.read(&self.fail_stop) {
            return Err(EngineError::StopFailed(reason));
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(self.final_offset_or_empty())
    }

    async fn kill(&self) -> SourceOffset {
        self.running.store(false, Ordering::SeqCst);
        self.final_offset_or_empty()
    }

    async fn capture_batch(&self) -> Result<Vec<u8>, EngineError> {
        if let Some(delay) = self.read(&self.capture_delay) {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.read(&self.fail_capture) {
            return Err(EngineError::CaptureFailed(reason));
        }
        Ok(self.read(&self.capture_payload))
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.read(&self.metrics)
    }
}
