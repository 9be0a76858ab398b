//! Compensating rollback of completed bulk actions.

use std::sync::Arc;

use serde::Serialize;
use storepilot_core::error::CoreError;
use storepilot_core::types::{ActorContext, OrderId};
use storepilot_store::models::progress::ItemError;
use storepilot_store::{KvStore, RollbackStore};

use crate::config::EngineConfig;
use crate::executors::executor_for;
use crate::gateway::OrderGateway;

/// Per-item outcome of a rollback request.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackOutcome {
    pub rollback_id: String,
    pub undone: Vec<OrderId>,
    pub failed: Vec<ItemError>,
    pub unsupported: Vec<OrderId>,
}

/// Reverses a completed bulk action from its captured prior state.
pub struct RollbackEngine {
    gateway: Arc<dyn OrderGateway>,
    rollbacks: RollbackStore,
}

impl RollbackEngine {
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        kv: Arc<dyn KvStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            gateway,
            rollbacks: RollbackStore::new(kv, config.record_ttl),
        }
    }

    /// Undo every captured item of a completed job.
    ///
    /// The record is read, not consumed, and is left intact afterward: a
    /// partially-failed rollback can be retried and will re-attempt the
    /// items that failed (re-applying an already-rolled-back item is
    /// harmless for status and tag snapshots, and a deleted note simply
    /// fails again as unresolvable).
    pub async fn rollback(
        &self,
        actor: &ActorContext,
        rollback_id: &str,
    ) -> Result<RollbackOutcome, CoreError> {
        let record = self
            .rollbacks
            .get(&actor.principal, rollback_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Rollback record",
                id: rollback_id.to_string(),
            })?;

        if !record.action.is_mutating() {
            return Err(CoreError::Unsupported(format!(
                "Action '{}' does not mutate orders and cannot be rolled back",
                record.action
            )));
        }
        if record.orders.is_empty() {
            return Err(CoreError::Unsupported(
                "No reversible state was captured for this job".to_string(),
            ));
        }

        let executor = executor_for(record.action, Arc::clone(&self.gateway));
        let mut outcome = RollbackOutcome {
            rollback_id: rollback_id.to_string(),
            undone: Vec::new(),
            failed: Vec::new(),
            unsupported: Vec::new(),
        };

        for (order_id, prior) in &record.orders {
            match executor.rollback(*order_id, prior).await {
                Ok(()) => outcome.undone.push(*order_id),
                Err(CoreError::Unsupported(_)) => outcome.unsupported.push(*order_id),
                Err(e) => outcome.failed.push(ItemError {
                    order_id: *order_id,
                    message: e.to_string(),
                }),
            }
        }

        tracing::info!(
            rollback_id,
            principal = %actor.principal,
            undone = outcome.undone.len(),
            failed = outcome.failed.len(),
            unsupported = outcome.unsupported.len(),
            "Rollback finished",
        );

        Ok(outcome)
    }
}
