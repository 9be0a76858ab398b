//! Key shapes for the shared TTL store.
//!
//! Drafts, progress, and rollback records are namespaced by the acting
//! principal; bulk jobs are not, because they are handed to the scheduler
//! and consumed outside the originating request context.

use crate::models::draft::DraftKind;

pub fn draft(principal: &str, kind: DraftKind, id: &str) -> String {
    format!("{principal}:{}:draft:{id}", kind.as_str())
}

pub fn job(id: &str) -> String {
    format!("job:{id}")
}

pub fn progress(principal: &str, id: &str) -> String {
    format!("{principal}:progress:{id}")
}

pub fn rollback(principal: &str, id: &str) -> String {
    format!("{principal}:rollback:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_keys_embed_principal_and_kind() {
        assert_eq!(
            draft("user-7", DraftKind::BulkAction, "abc"),
            "user-7:bulk_action:draft:abc"
        );
    }

    #[test]
    fn different_principals_never_collide() {
        assert_ne!(
            draft("user-1", DraftKind::Refund, "abc"),
            draft("user-2", DraftKind::Refund, "abc")
        );
        assert_ne!(progress("user-1", "p"), progress("user-2", "p"));
        assert_ne!(rollback("user-1", "r"), rollback("user-2", "r"));
    }

    #[test]
    fn different_kinds_never_collide() {
        assert_ne!(
            draft("u", DraftKind::Refund, "abc"),
            draft("u", DraftKind::BulkAction, "abc")
        );
    }
}
