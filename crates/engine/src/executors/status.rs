//! `update_status` executor.

use std::sync::Arc;

use async_trait::async_trait;
use storepilot_core::actions::{ActionKind, BulkAction};
use storepilot_core::error::CoreError;
use storepilot_core::order::Order;
use storepilot_core::types::{ActorContext, OrderId};
use storepilot_store::models::rollback::PriorState;

use super::{mismatched_params, ActionExecutor, ApplyOutcome};
use crate::gateway::OrderGateway;

pub struct StatusExecutor {
    gateway: Arc<dyn OrderGateway>,
}

impl StatusExecutor {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ActionExecutor for StatusExecutor {
    async fn apply(
        &self,
        order: &Order,
        action: &BulkAction,
        _actor: &ActorContext,
    ) -> Result<ApplyOutcome, CoreError> {
        let (status, notify) = match action {
            BulkAction::UpdateStatus { status, notify } => (*status, *notify),
            _ => return Err(mismatched_params(ActionKind::UpdateStatus)),
        };
        self.gateway.update_status(order.id, status, notify).await?;
        Ok(ApplyOutcome::Mutated {
            prior: PriorState::Status {
                status: order.status,
            },
        })
    }

    async fn rollback(&self, order_id: OrderId, prior: &PriorState) -> Result<(), CoreError> {
        let status = match prior {
            PriorState::Status { status } => *status,
            _ => {
                return Err(CoreError::Unsupported(
                    "No reversible status was captured for this order".to_string(),
                ))
            }
        };
        // Restoring a status never re-triggers customer notifications.
        self.gateway.update_status(order_id, status, false).await
    }
}
