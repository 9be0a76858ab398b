//! `export_csv` executor.
//!
//! The only non-mutating action: applying it extracts one row of raw cell
//! values, and rollback is never supported.

use async_trait::async_trait;
use storepilot_core::actions::{ActionKind, BulkAction};
use storepilot_core::csv::{effective_fields, field_value};
use storepilot_core::error::CoreError;
use storepilot_core::order::Order;
use storepilot_core::types::{ActorContext, OrderId};
use storepilot_store::models::rollback::PriorState;

use super::{mismatched_params, ActionExecutor, ApplyOutcome};

#[derive(Default)]
pub struct ExportExecutor;

impl ExportExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionExecutor for ExportExecutor {
    async fn apply(
        &self,
        order: &Order,
        action: &BulkAction,
        _actor: &ActorContext,
    ) -> Result<ApplyOutcome, CoreError> {
        let fields = match action {
            BulkAction::ExportCsv { fields } => effective_fields(fields),
            _ => return Err(mismatched_params(ActionKind::ExportCsv)),
        };
        let row = fields.iter().map(|f| field_value(order, *f)).collect();
        Ok(ApplyOutcome::Exported { row })
    }

    async fn rollback(&self, _order_id: OrderId, _prior: &PriorState) -> Result<(), CoreError> {
        Err(CoreError::Unsupported(
            "Export actions do not mutate orders and cannot be rolled back".to_string(),
        ))
    }
}
