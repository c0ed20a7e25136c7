use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::ExecutionEngine;
use crate::metrics::SNAPSHOT_CAPTURES;

use super::store::SnapshotStore;
use super::types::{SnapshotError, SnapshotStatus};

/// Coordinates asynchronous snapshot capture for a single pipeline.
///
/// At most one capture runs at a time. A capture that completes after
/// the snapshot was deleted mid-flight is discarded instead of
/// resurrecting the deleted payload, tracked with a generation counter
/// that every delete bumps.
#[derive(Clone)]
pub struct SnapshotController {
    store: Arc<dyn SnapshotStore>,
    in_progress: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl SnapshotController {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            in_progress: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Kicks off an asynchronous capture through the engine. Returns
    /// immediately; the payload lands in the store when the engine has
    /// produced a batch.
    pub fn request(
        &self,
        engine: Arc<dyn ExecutionEngine>,
        name: &str,
        rev: &str,
    ) -> Result<(), SnapshotError> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            return Err(SnapshotError::CaptureInProgress);
        }

        let controller = self.clone();
        let generation = self.generation.load(Ordering::SeqCst);
        let name = name.to_string();
        let rev = rev.to_string();
        tokio::spawn(async move {
            controller.capture(engine, generation, &name, &rev).await;
        });
        Ok(())
    }

    async fn capture(
        &self,
        engine: Arc<dyn ExecutionEngine>,
        generation: u64,
        name: &str,
        rev: &str,
    ) {
        let result = engine.capture_batch().await;
        match result {
            Ok(payload) => {
                if self.generation.load(Ordering::SeqCst) != generation {
                    debug!(name, rev, "Discarding snapshot captured for a deleted slot");
                    SNAPSHOT_CAPTURES.with_label_values(&["stale"]).inc();
                } else if let Err(e) = self.store.put(name, rev, &payload) {
                    warn!(name, rev, "Failed to persist snapshot: {e}");
                    SNAPSHOT_CAPTURES.with_label_values(&["failed"]).inc();
                } else {
                    debug!(name, rev, bytes = payload.len(), "Snapshot captured");
                    SNAPSHOT_CAPTURES.with_label_values(&["ok"]).inc();
                }
            }
            Err(e) => {
                warn!(name, rev, "Snapshot capture failed: {e}");
                SNAPSHOT_CAPTURES.with_label_values(&["failed"]).inc();
            }
        }
        // A delete bumps the generation and has already released the
        // flag for the next capture; a stale task must not release it
        // again underneath that capture.
        if self.generation.load(Ordering::SeqCst) == generation {
            self.in_progress.store(false, Ordering::SeqCst);
        }
    }

    pub fn status(&self, name: &str, rev: &str) -> Result<SnapshotStatus, SnapshotError> {
        Ok(SnapshotStatus {
            exists: self.store.exists(name, rev)?,
            in_progress: self.in_progress.load(Ordering::SeqCst),
        })
    }

    pub fn get(&self, name: &str, rev: &str) -> Result<Option<Vec<u8>>, SnapshotError> {
        self.store.get(name, rev)
    }

    /// Deletes the stored snapshot and invalidates any capture still in
    /// flight so its result is dropped on arrival.
    pub fn delete(&self, name: &str, rev: &str) -> Result<(), SnapshotError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.in_progress.store(false, Ordering::SeqCst);
        self.store.delete(name, rev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SqliteSnapshotStore;
    use crate::testing::MockEngine;
    use std::time::Duration;

    fn controller() -> SnapshotController {
        SnapshotController::new(Arc::new(SqliteSnapshotStore::in_memory().unwrap()))
    }

    async fn wait_until_idle(controller: &SnapshotController) {
        for _ in 0..100 {
            if !controller.status("p", "0").unwrap().in_progress {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("capture never completed");
    }

    #[tokio::test]
    async fn test_capture_persists_payload() {
        let controller = controller();
        let engine = Arc::new(MockEngine::new());
        engine.set_capture_payload(b"[{\"id\":\"r1\"}]".to_vec());

        controller.request(engine, "p", "0").unwrap();
        wait_until_idle(&controller).await;

        let status = controller.status("p", "0").unwrap();
        assert!(status.exists);
        assert!(!status.in_progress);
        assert_eq!(
            controller.get("p", "0").unwrap().unwrap(),
            b"[{\"id\":\"r1\"}]"
        );
    }

    #[tokio::test]
    async fn test_concurrent_request_is_rejected() {
        let controller = controller();
        let engine = Arc::new(MockEngine::new());
        engine.set_capture_delay(Duration::from_millis(100));

        controller.request(engine.clone(), "p", "0").unwrap();
        assert!(matches!(
            controller.request(engine, "p", "0"),
            Err(SnapshotError::CaptureInProgress)
        ));
        wait_until_idle(&controller).await;
    }

    #[tokio::test]
    async fn test_failed_capture_clears_in_progress() {
        let controller = controller();
        let engine = Arc::new(MockEngine::new());
        engine.fail_capture("source unavailable");

        controller.request(engine, "p", "0").unwrap();
        wait_until_idle(&controller).await;

        let status = controller.status("p", "0").unwrap();
        assert!(!status.exists);
        assert!(!status.in_progress);
    }

    #[tokio::test]
    async fn test_delete_mid_capture_discards_late_result() {
        let controller = controller();
        let engine = Arc::new(MockEngine::new());
        engine.set_capture_delay(Duration::from_millis(50));

        controller.request(engine, "p", "0").unwrap();
        controller.delete("p", "0").unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!controller.status("p", "0").unwrap().exists);
    }

    #[tokio::test]
    async fn test_stale_task_does_not_release_next_capture() {
        let controller = controller();
        let engine = Arc::new(MockEngine::new());
        engine.set_capture_delay(Duration::from_millis(50));

        controller.request(engine.clone(), "p", "0").unwrap();
        controller.delete("p", "0").unwrap();

        engine.set_capture_delay(Duration::from_millis(300));
        engine.set_capture_payload(b"fresh".to_vec());
        controller.request(engine.clone(), "p", "0").unwrap();

        // The invalidated first task has finished by now; the second
        // capture must still be reported as running and hold the slot.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(controller.status("p", "0").unwrap().in_progress);
        assert!(matches!(
            controller.request(engine, "p", "0"),
            Err(SnapshotError::CaptureInProgress)
        ));

        wait_until_idle(&controller).await;
        assert_eq!(controller.get("p", "0").unwrap().unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_delete_then_recapture() {
        let controller = controller();
        let engine = Arc::new(MockEngine::new());
        engine.set_capture_payload(b"first".to_vec());

        controller.request(engine.clone(), "p", "0").unwrap();
        wait_until_idle(&controller).await;
        controller.delete("p", "0").unwrap();

        engine.set_capture_payload(b"second".to_vec());
        controller.request(engine, "p", "0").unwrap();
        wait_until_idle(&controller).await;

        assert_eq!(controller.get("p", "0").unwrap().unwrap(), b"second");
    }
}
