//! TTL key-value store contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use storepilot_core::error::CoreError;

/// Error raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend is unreachable or rejected the operation.
    #[error("store backend unavailable: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("stored value could not be decoded: {0}")]
    Codec(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::Storage(e.to_string())
    }
}

/// Scoped, expiring key-value storage with an atomic claim primitive.
///
/// `claim` is the concurrency-critical operation: of N concurrent callers
/// against the same present key, at most one receives the value and all
/// others observe absent. Expiry is lazy — nothing actively evicts entries,
/// a `load` or `claim` of an expired key simply reports absent — so callers
/// cannot distinguish "expired" from "never existed" from "already claimed".
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry and resetting
    /// its expiry to `ttl` from now.
    async fn store(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError>;

    /// Non-destructive read. Absent when missing or expired.
    async fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Atomic load-then-delete. Absent when missing, expired, or lost to a
    /// concurrent claimer.
    async fn claim(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Remove `key` if present. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Claim `key`, treating backend failure as "could not claim".
///
/// When the claim itself errors the key is re-checked once, purely to pick
/// the right log line — losing a race and losing the backend must both read
/// as absent to the caller, and neither may ever be reported as success.
pub async fn claim_or_absent(kv: &Arc<dyn KvStore>, key: &str) -> Option<Value> {
    match kv.claim(key).await {
        Ok(value) => value,
        Err(e) => {
            match kv.load(key).await {
                Ok(Some(_)) => tracing::warn!(
                    key,
                    error = %e,
                    "Claim failed with the entry still present; treating as not claimed",
                ),
                _ => tracing::warn!(
                    key,
                    error = %e,
                    "Claim failed and the entry is absent on re-check",
                ),
            }
            None
        }
    }
}
