//! Typed draft storage over the shared TTL store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use storepilot_core::error::CoreError;
use storepilot_core::types::{new_token, ActorContext};

use crate::keys;
use crate::kv::{claim_or_absent, KvStore};
use crate::models::draft::{Draft, DraftKind};

/// Create, preview, claim, and cancel drafts.
///
/// Keys are scoped by acting principal and draft kind, so cross-user and
/// cross-kind access both read as not found.
#[derive(Clone)]
pub struct DraftStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Stage a new draft and return it (with its generated id and expiry).
    pub async fn create(
        &self,
        actor: &ActorContext,
        kind: DraftKind,
        payload: serde_json::Value,
        preview: String,
    ) -> Result<Draft, CoreError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| CoreError::Storage(format!("draft ttl out of range: {e}")))?;
        let draft = Draft {
            id: new_token(),
            kind,
            payload,
            preview,
            created_at: now,
            expires_at: now + ttl,
        };
        let key = keys::draft(&actor.principal, kind, &draft.id);
        let value = serde_json::to_value(&draft)
            .map_err(|e| CoreError::Storage(format!("draft could not be encoded: {e}")))?;
        self.kv.store(&key, value, self.ttl).await?;
        Ok(draft)
    }

    /// Non-destructive read for preview endpoints.
    pub async fn load(
        &self,
        actor: &ActorContext,
        kind: DraftKind,
        id: &str,
    ) -> Result<Option<Draft>, CoreError> {
        let key = keys::draft(&actor.principal, kind, id);
        match self.kv.load(&key).await? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    /// Destructive claim: at most one of N concurrent callers receives the
    /// draft; everyone else — and every caller after expiry — observes
    /// `None`. A store failure during the claim also reads as `None`.
    pub async fn claim(
        &self,
        actor: &ActorContext,
        kind: DraftKind,
        id: &str,
    ) -> Result<Option<Draft>, CoreError> {
        let key = keys::draft(&actor.principal, kind, id);
        match claim_or_absent(&self.kv, &key).await {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    /// Explicitly discard a draft. Discarding an absent draft is not an
    /// error.
    pub async fn cancel(
        &self,
        actor: &ActorContext,
        kind: DraftKind,
        id: &str,
    ) -> Result<(), CoreError> {
        let key = keys::draft(&actor.principal, kind, id);
        self.kv.delete(&key).await?;
        Ok(())
    }
}

fn decode(value: serde_json::Value) -> Result<Draft, CoreError> {
    serde_json::from_value(value)
        .map_err(|e| CoreError::Storage(format!("corrupt draft record: {e}")))
}
