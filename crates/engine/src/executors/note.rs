//! `add_note` executor.

use std::sync::Arc;

use async_trait::async_trait;
use storepilot_core::actions::{ActionKind, BulkAction};
use storepilot_core::error::CoreError;
use storepilot_core::order::Order;
use storepilot_core::types::{ActorContext, OrderId};
use storepilot_store::models::rollback::PriorState;

use super::{mismatched_params, ActionExecutor, ApplyOutcome};
use crate::gateway::OrderGateway;

pub struct NoteExecutor {
    gateway: Arc<dyn OrderGateway>,
}

impl NoteExecutor {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ActionExecutor for NoteExecutor {
    async fn apply(
        &self,
        order: &Order,
        action: &BulkAction,
        actor: &ActorContext,
    ) -> Result<ApplyOutcome, CoreError> {
        let (note, customer_note) = match action {
            BulkAction::AddNote {
                note,
                customer_note,
            } => (note.as_str(), *customer_note),
            _ => return Err(mismatched_params(ActionKind::AddNote)),
        };
        let note_id = self
            .gateway
            .add_note(order.id, note, &actor.display_name, customer_note)
            .await?;
        Ok(ApplyOutcome::Mutated {
            prior: PriorState::Note { note_id },
        })
    }

    async fn rollback(&self, order_id: OrderId, prior: &PriorState) -> Result<(), CoreError> {
        let note_id = match prior {
            PriorState::Note { note_id } => *note_id,
            _ => {
                return Err(CoreError::Unsupported(
                    "No created note id was captured for this order".to_string(),
                ))
            }
        };
        self.gateway.delete_note(order_id, note_id).await
    }
}
