use crate::types::OrderId;

/// Join a list of ids for display in error messages.
fn join_ids(ids: &[OrderId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Domain-level error for all assistant operations.
///
/// Rejections (`Validation`, `NotFound`, `Conflict`, `LimitExceeded`) are
/// raised before any draft, job, progress, or rollback record is created, so
/// a rejected request never leaves partial state behind. A claim against an
/// expired, already-consumed, or never-issued draft always surfaces as
/// `NotFound` — the three cases are intentionally indistinguishable.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A single record (draft, job, progress, rollback, order, product)
    /// could not be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// One or more target orders could not be resolved during batch
    /// preparation. Lists every missing id, not just the first.
    #[error("Orders not found: {}", join_ids(.order_ids))]
    OrdersNotFound { order_ids: Vec<OrderId> },

    /// Bad or missing parameters, unknown action, unknown target status.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Item state changed between drafting and confirmation. The caller
    /// must prepare a new draft; the old one is already consumed.
    #[error("{message} (ids: {})", join_ids(.ids))]
    Conflict { message: String, ids: Vec<OrderId> },

    /// Batch above the hard cap.
    #[error("Batch size {count} exceeds maximum of {max}")]
    LimitExceeded { count: usize, max: usize },

    /// The requested operation is not defined for this action (e.g.
    /// rolling back an export).
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The shared record store failed or returned a corrupt record.
    #[error("Store error: {0}")]
    Storage(String),

    /// A collaborator (platform gateway, job scheduler) failed.
    #[error("Upstream collaborator error: {0}")]
    Gateway(String),
}
