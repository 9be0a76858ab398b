//! Per-action executors.
//!
//! Each executor applies one action to one order through the gateway and
//! reports the prior state needed to reverse it. Executors are stateless;
//! the action's parameters travel with the job and are matched inside
//! `apply`.

mod export;
mod note;
mod status;
mod tag;

use std::sync::Arc;

use async_trait::async_trait;
use storepilot_core::actions::{ActionKind, BulkAction};
use storepilot_core::error::CoreError;
use storepilot_core::order::Order;
use storepilot_core::types::{ActorContext, OrderId};
use storepilot_store::models::rollback::PriorState;

pub use export::ExportExecutor;
pub use note::NoteExecutor;
pub use status::StatusExecutor;
pub use tag::TagExecutor;

/// Outcome of applying an action to a single order.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The order was mutated; `prior` is what reverses it.
    Mutated { prior: PriorState },
    /// A non-mutating action produced an export row.
    Exported { row: Vec<String> },
}

/// One action's apply/rollback pair.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Apply the action to one order.
    async fn apply(
        &self,
        order: &Order,
        action: &BulkAction,
        actor: &ActorContext,
    ) -> Result<ApplyOutcome, CoreError>;

    /// Reverse a previously applied mutation from its captured prior
    /// state. Executors for non-mutating actions, and any executor handed
    /// a prior state it did not capture, return `Unsupported`.
    async fn rollback(&self, order_id: OrderId, prior: &PriorState) -> Result<(), CoreError>;
}

/// Resolve the executor for an action kind.
pub fn executor_for(kind: ActionKind, gateway: Arc<dyn crate::gateway::OrderGateway>) -> Box<dyn ActionExecutor> {
    match kind {
        ActionKind::UpdateStatus => Box::new(StatusExecutor::new(gateway)),
        ActionKind::AddTag => Box::new(TagExecutor::new(gateway)),
        ActionKind::AddNote => Box::new(NoteExecutor::new(gateway)),
        ActionKind::ExportCsv => Box::new(ExportExecutor::new()),
    }
}

/// Error for the internal invariant that an executor only ever sees its
/// own action's parameters.
pub(crate) fn mismatched_params(kind: ActionKind) -> CoreError {
    CoreError::Validation(format!(
        "Executor for '{kind}' received parameters for a different action"
    ))
}
