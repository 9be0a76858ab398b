//! Bulk job model: a unit of deferred or immediate work.

use serde::{Deserialize, Serialize};
use storepilot_core::actions::BulkAction;
use storepilot_core::types::{ActorContext, OrderId, Timestamp};

/// A unit of work spawned by confirming a bulk draft.
///
/// Created once per confirmation, immutable after creation, and consumed
/// exactly once (via claim) by either the inline executor or a
/// scheduler-driven worker. `draft_id` is a reference for tracing only; the
/// draft itself is already consumed by the time a job exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkJob {
    pub id: String,
    /// Acting principal, carried so scheduler-driven execution can address
    /// the principal-scoped progress and rollback records.
    pub actor: ActorContext,
    /// Deduplicated target ids in selection order (1..=1000 entries).
    pub order_ids: Vec<OrderId>,
    pub action: BulkAction,
    pub draft_id: String,
    pub progress_id: String,
    pub rollback_id: String,
    pub created_at: Timestamp,
}
