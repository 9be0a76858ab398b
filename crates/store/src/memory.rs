//! In-memory store backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::kv::{KvStore, StoreError};

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-memory [`KvStore`] backend.
///
/// Entry deadlines use `tokio::time::Instant`, so tests can cross TTL
/// boundaries under a paused clock. Expiry is lazy: an expired entry stays
/// in the map until the key is next read, claimed, or overwritten. `claim`
/// removes the entry under the same lock acquisition that reads it, which
/// is what makes it atomic with respect to concurrent claimers.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn store(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone()))
    }

    async fn claim(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn store_then_load() {
        let store = MemoryStore::new();
        store.store("k", json!({"a": 1}), TTL).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn load_is_non_destructive() {
        let store = MemoryStore::new();
        store.store("k", json!(1), TTL).await.unwrap();
        store.load("k").await.unwrap();
        assert!(store.load("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn claim_consumes_the_entry() {
        let store = MemoryStore::new();
        store.store("k", json!(1), TTL).await.unwrap();
        assert_eq!(store.claim("k").await.unwrap(), Some(json!(1)));
        assert_eq!(store.claim("k").await.unwrap(), None);
        assert_eq!(store.load("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.store("k", json!(1), TTL).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_lazily_at_the_boundary() {
        let store = MemoryStore::new();
        store.store("k", json!(1), Duration::from_secs(300)).await.unwrap();

        // Just inside the TTL: present.
        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(store.load("k").await.unwrap().is_some());

        // Just past the TTL: absent for both load and claim.
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.load("k").await.unwrap(), None);
        assert_eq!(store.claim("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_resets_the_ttl_and_value() {
        let store = MemoryStore::new();
        store.store("k", json!(1), TTL).await.unwrap();
        store.store("k", json!(2), TTL).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let store = Arc::new(MemoryStore::new());
        store.store("k", json!("prize"), TTL).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.claim("k").await.unwrap() }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
