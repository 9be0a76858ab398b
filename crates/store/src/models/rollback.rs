//! Rollback model: captured prior state for a completed bulk action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storepilot_core::actions::ActionKind;
use storepilot_core::order::OrderStatus;
use storepilot_core::types::{NoteId, OrderId, Timestamp};

/// The minimal prior-state snapshot needed to reverse one applied action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorState {
    /// Status before an `update_status` application.
    Status { status: OrderStatus },
    /// Full tag set before an `add_tag` merge.
    Tags { tags: Vec<String> },
    /// Id of the note an `add_note` application created.
    Note { note_id: NoteId },
}

/// Captured prior state for a bulk action, keyed by rollback id.
///
/// Created empty at job start, appended to as each item mutation succeeds,
/// and persisted at completion. A rollback request reads it without
/// consuming it, so a partially-failed rollback can be retried against the
/// remaining items. A `BTreeMap` keeps rollback iteration deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub id: String,
    pub action: ActionKind,
    pub orders: BTreeMap<OrderId, PriorState>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl RollbackRecord {
    /// A fresh, empty record for a job that is about to run.
    pub fn empty(id: String, action: ActionKind, now: Timestamp, expires_at: Timestamp) -> Self {
        Self {
            id,
            action,
            orders: BTreeMap::new(),
            created_at: now,
            expires_at,
        }
    }
}
