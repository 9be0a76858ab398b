//! `add_tag` executor.

use std::sync::Arc;

use async_trait::async_trait;
use storepilot_core::actions::{ActionKind, BulkAction};
use storepilot_core::error::CoreError;
use storepilot_core::order::Order;
use storepilot_core::types::{ActorContext, OrderId};
use storepilot_store::models::rollback::PriorState;

use super::{mismatched_params, ActionExecutor, ApplyOutcome};
use crate::gateway::OrderGateway;

pub struct TagExecutor {
    gateway: Arc<dyn OrderGateway>,
}

impl TagExecutor {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ActionExecutor for TagExecutor {
    async fn apply(
        &self,
        order: &Order,
        action: &BulkAction,
        _actor: &ActorContext,
    ) -> Result<ApplyOutcome, CoreError> {
        let tags = match action {
            BulkAction::AddTag { tags } => tags,
            _ => return Err(mismatched_params(ActionKind::AddTag)),
        };

        // Idempotent union: tags the order already carries are not added
        // twice, and an already-complete tag set skips the write entirely.
        let mut merged = order.tags.clone();
        for tag in tags {
            if !merged.contains(tag) {
                merged.push(tag.clone());
            }
        }
        if merged.len() != order.tags.len() {
            self.gateway.set_tags(order.id, &merged).await?;
        }

        Ok(ApplyOutcome::Mutated {
            prior: PriorState::Tags {
                tags: order.tags.clone(),
            },
        })
    }

    async fn rollback(&self, order_id: OrderId, prior: &PriorState) -> Result<(), CoreError> {
        let tags = match prior {
            PriorState::Tags { tags } => tags,
            _ => {
                return Err(CoreError::Unsupported(
                    "No reversible tag set was captured for this order".to_string(),
                ))
            }
        };
        self.gateway.set_tags(order_id, tags).await
    }
}
