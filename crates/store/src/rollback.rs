//! Typed rollback-record storage over the shared TTL store.

use std::sync::Arc;
use std::time::Duration;

use storepilot_core::error::CoreError;

use crate::keys;
use crate::kv::KvStore;
use crate::models::rollback::RollbackRecord;

/// Persist and read [`RollbackRecord`]s.
///
/// Records are only ever written by the executing job and read by rollback
/// requests; they are never claimed or deleted, so a partially-failed
/// rollback can be retried until the record expires.
#[derive(Clone)]
pub struct RollbackStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl RollbackStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    pub async fn put(&self, principal: &str, record: &RollbackRecord) -> Result<(), CoreError> {
        let value = serde_json::to_value(record)
            .map_err(|e| CoreError::Storage(format!("rollback record could not be encoded: {e}")))?;
        self.kv
            .store(&keys::rollback(principal, &record.id), value, self.ttl)
            .await?;
        Ok(())
    }

    pub async fn get(
        &self,
        principal: &str,
        id: &str,
    ) -> Result<Option<RollbackRecord>, CoreError> {
        match self.kv.load(&keys::rollback(principal, id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value).map_err(|e| {
                CoreError::Storage(format!("corrupt rollback record: {e}"))
            })?)),
            None => Ok(None),
        }
    }
}
