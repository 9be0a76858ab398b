//! Progress storage and the throttled tracker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use storepilot_core::error::CoreError;
use storepilot_core::types::OrderId;
use tokio::time::Instant;

use crate::keys;
use crate::kv::KvStore;
use crate::models::progress::{ExportArtifact, Progress, ProgressStatus};

/// Persist and poll [`Progress`] records.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl ProgressStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    pub async fn put(&self, principal: &str, progress: &Progress) -> Result<(), CoreError> {
        let value = serde_json::to_value(progress)
            .map_err(|e| CoreError::Storage(format!("progress could not be encoded: {e}")))?;
        self.kv
            .store(&keys::progress(principal, &progress.id), value, self.ttl)
            .await?;
        Ok(())
    }

    pub async fn get(&self, principal: &str, id: &str) -> Result<Option<Progress>, CoreError> {
        match self.kv.load(&keys::progress(principal, id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value).map_err(|e| {
                CoreError::Storage(format!("corrupt progress record: {e}"))
            })?)),
            None => Ok(None),
        }
    }
}

/// Wraps a [`Progress`] record during batch execution and throttles its
/// writes.
///
/// State transitions (`running`, `completed`) always write. Per-item
/// updates write at most once per interval; a dropped per-item write only
/// delays what a poller sees, so its storage errors are logged and
/// swallowed, while transition writes propagate their errors.
pub struct ProgressTracker {
    store: ProgressStore,
    principal: String,
    progress: Progress,
    interval: Duration,
    last_write: Option<Instant>,
}

impl ProgressTracker {
    pub fn new(
        store: ProgressStore,
        principal: String,
        progress: Progress,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            principal,
            progress,
            interval,
            last_write: None,
        }
    }

    /// Current in-memory state (may be ahead of what is persisted).
    pub fn snapshot(&self) -> &Progress {
        &self.progress
    }

    /// Consume the tracker, returning the final record.
    pub fn into_progress(self) -> Progress {
        self.progress
    }

    /// Transition to `running` and force-persist.
    pub async fn mark_running(&mut self) -> Result<(), CoreError> {
        self.progress.status = ProgressStatus::Running;
        self.progress.started_at = Some(Utc::now());
        self.write(true).await
    }

    /// Record a successful item; persists subject to throttling.
    pub async fn item_succeeded(&mut self) {
        self.progress.item_succeeded();
        self.write_throttled().await;
    }

    /// Record a failed item; persists subject to throttling.
    pub async fn item_failed(&mut self, order_id: OrderId, message: impl Into<String>) {
        self.progress.item_failed(order_id, message);
        self.write_throttled().await;
    }

    /// Transition to `completed`, attach any artifact, and force-persist.
    pub async fn complete(&mut self, artifact: Option<ExportArtifact>) -> Result<(), CoreError> {
        self.progress.status = ProgressStatus::Completed;
        self.progress.completed_at = Some(Utc::now());
        self.progress.artifact = artifact;
        self.write(true).await
    }

    async fn write_throttled(&mut self) {
        if let Err(e) = self.write(false).await {
            tracing::warn!(
                progress_id = %self.progress.id,
                error = %e,
                "Throttled progress write failed; continuing",
            );
        }
    }

    async fn write(&mut self, force: bool) -> Result<(), CoreError> {
        let now = Instant::now();
        let due = match self.last_write {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        };
        if !force && !due {
            return Ok(());
        }
        self.progress.last_updated = Utc::now();
        self.store.put(&self.principal, &self.progress).await?;
        self.last_write = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use storepilot_core::actions::ActionKind;

    use super::*;
    use crate::memory::MemoryStore;

    fn fixtures() -> (ProgressStore, Progress) {
        let store = ProgressStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(3600));
        let progress = Progress::queued("p1".into(), ActionKind::AddTag, 100, Utc::now());
        (store, progress)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (store, progress) = fixtures();
        store.put("user-1", &progress).await.unwrap();
        let loaded = store.get("user-1", "p1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ProgressStatus::Queued);
        assert_eq!(loaded.order_count, 100);
    }

    #[tokio::test]
    async fn progress_is_principal_scoped() {
        let (store, progress) = fixtures();
        store.put("user-1", &progress).await.unwrap();
        assert!(store.get("user-2", "p1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn item_writes_are_throttled() {
        let (store, progress) = fixtures();
        let mut tracker = ProgressTracker::new(
            store.clone(),
            "user-1".into(),
            progress,
            Duration::from_secs(2),
        );
        tracker.mark_running().await.unwrap();

        // Within the interval: the in-memory count advances but the
        // persisted record still shows the forced `running` write.
        tracker.item_succeeded().await;
        tracker.item_succeeded().await;
        let polled = store.get("user-1", "p1").await.unwrap().unwrap();
        assert_eq!(polled.processed, 0);

        // Once the interval elapses the next item update is persisted.
        tokio::time::advance(Duration::from_secs(3)).await;
        tracker.item_succeeded().await;
        let polled = store.get("user-1", "p1").await.unwrap().unwrap();
        assert_eq!(polled.processed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_always_persists_the_final_counters() {
        let (store, progress) = fixtures();
        let mut tracker = ProgressTracker::new(
            store.clone(),
            "user-1".into(),
            progress,
            Duration::from_secs(3600),
        );
        tracker.mark_running().await.unwrap();
        tracker.item_succeeded().await;
        tracker.item_failed(42, "boom").await;
        tracker.complete(None).await.unwrap();

        let polled = store.get("user-1", "p1").await.unwrap().unwrap();
        assert_eq!(polled.status, ProgressStatus::Completed);
        assert_eq!(polled.processed, 2);
        assert_eq!(polled.updated, 1);
        assert_eq!(polled.failed, 1);
        assert!(polled.completed_at.is_some());
    }
}
