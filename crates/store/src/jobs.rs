//! Typed bulk-job storage over the shared TTL store.

use std::sync::Arc;
use std::time::Duration;

use storepilot_core::error::CoreError;

use crate::keys;
use crate::kv::{claim_or_absent, KvStore};
use crate::models::job::BulkJob;

/// Persist and consume [`BulkJob`] records.
#[derive(Clone)]
pub struct JobStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl JobStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Persist a freshly created job.
    pub async fn create(&self, job: &BulkJob) -> Result<(), CoreError> {
        let value = serde_json::to_value(job)
            .map_err(|e| CoreError::Storage(format!("job could not be encoded: {e}")))?;
        self.kv.store(&keys::job(&job.id), value, self.ttl).await?;
        Ok(())
    }

    /// Consume a job for execution. A second delivery of the same id (e.g.
    /// a scheduler misfire) observes `None` and must not execute.
    pub async fn claim(&self, id: &str) -> Result<Option<BulkJob>, CoreError> {
        match claim_or_absent(&self.kv, &keys::job(id)).await {
            Some(value) => Ok(Some(serde_json::from_value(value).map_err(|e| {
                CoreError::Storage(format!("corrupt job record: {e}"))
            })?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use storepilot_core::actions::BulkAction;
    use storepilot_core::order::OrderStatus;
    use storepilot_core::types::ActorContext;

    use super::*;
    use crate::memory::MemoryStore;

    fn job() -> BulkJob {
        BulkJob {
            id: "j1".into(),
            actor: ActorContext::new("user-1", "Jo"),
            order_ids: vec![1, 2, 3],
            action: BulkAction::UpdateStatus {
                status: OrderStatus::Completed,
                notify: false,
            },
            draft_id: "d1".into(),
            progress_id: "p1".into(),
            rollback_id: "r1".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn job_is_consumed_exactly_once() {
        let jobs = JobStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        jobs.create(&job()).await.unwrap();

        let claimed = jobs.claim("j1").await.unwrap().unwrap();
        assert_eq!(claimed.order_ids, vec![1, 2, 3]);
        assert_eq!(claimed.progress_id, "p1");

        // A duplicate scheduler delivery finds nothing to run.
        assert!(jobs.claim("j1").await.unwrap().is_none());
    }
}
