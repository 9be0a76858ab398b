//! Shared identifier and actor types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform order identifier.
pub type OrderId = i64;

/// Platform product identifier.
pub type ProductId = i64;

/// Platform order-note identifier.
pub type NoteId = i64;

/// Platform refund identifier.
pub type RefundId = i64;

/// UTC timestamp used on all persisted records.
pub type Timestamp = DateTime<Utc>;

/// The acting principal on whose behalf an operation runs.
///
/// Passed explicitly into every operation that namespaces storage keys or
/// writes audit attribution; never read from ambient state. One principal
/// can never load, claim, or roll back another principal's records because
/// the principal id is part of every scoped storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Stable principal id used for key namespacing.
    pub principal: String,
    /// Human-readable name used in audit annotations (e.g. note authorship).
    pub display_name: String,
}

impl ActorContext {
    pub fn new(principal: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            display_name: display_name.into(),
        }
    }
}

/// Generate an opaque token for draft, job, progress, and rollback ids.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_opaque() {
        let a = new_token();
        let b = new_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
