//! Bulk action parameters and validation.
//!
//! Action parameters arrive as a loosely-typed payload from the chat layer
//! and are deserialized into [`BulkAction`] at the boundary; everything past
//! [`BulkAction::validate`] can rely on well-formed, known-action input.

use serde::{Deserialize, Serialize};

use crate::csv::ExportField;
use crate::error::CoreError;
use crate::order::OrderStatus;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of orders per bulk action.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Minimum orders required for a bulk action.
pub const MIN_BATCH_SIZE: usize = 1;

/// Maximum itemized errors kept on a progress record. Failures past the cap
/// still increment counters; only the itemization stops.
pub const MAX_COLLECTED_ERRORS: usize = 25;

/// Chunk size for batched order lookups against the platform.
pub const LOOKUP_CHUNK_SIZE: usize = 100;

/// Maximum number of tags per `add_tag` action.
pub const MAX_TAGS_PER_ACTION: usize = 20;

/// Maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 50;

/// Maximum length of a note body.
pub const MAX_NOTE_LENGTH: usize = 1000;

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// Action discriminator, stored on job and rollback records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UpdateStatus,
    AddTag,
    AddNote,
    ExportCsv,
}

impl ActionKind {
    /// Convert from the wire string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "update_status" => Ok(Self::UpdateStatus),
            "add_tag" => Ok(Self::AddTag),
            "add_note" => Ok(Self::AddNote),
            "export_csv" => Ok(Self::ExportCsv),
            _ => Err(CoreError::Validation(format!(
                "Unknown bulk action '{s}'. Must be one of: update_status, add_tag, add_note, export_csv"
            ))),
        }
    }

    /// Convert to the wire string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateStatus => "update_status",
            Self::AddTag => "add_tag",
            Self::AddNote => "add_note",
            Self::ExportCsv => "export_csv",
        }
    }

    /// Whether this action mutates orders. Non-mutating actions capture no
    /// rollback state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::ExportCsv)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action parameters
// ---------------------------------------------------------------------------

/// A bulk action with its per-kind parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    /// Transition every target to `status`. Customer notifications are
    /// suppressed unless `notify` is set.
    UpdateStatus {
        status: OrderStatus,
        #[serde(default)]
        notify: bool,
    },
    /// Merge `tags` into each target's existing tag set (idempotent union).
    AddTag { tags: Vec<String> },
    /// Append a note to each target.
    AddNote {
        note: String,
        /// Whether the note is visible to the customer.
        #[serde(default)]
        customer_note: bool,
    },
    /// Export targets to CSV. An empty field list selects all fields.
    ExportCsv {
        #[serde(default)]
        fields: Vec<ExportField>,
    },
}

impl BulkAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::UpdateStatus { .. } => ActionKind::UpdateStatus,
            Self::AddTag { .. } => ActionKind::AddTag,
            Self::AddNote { .. } => ActionKind::AddNote,
            Self::ExportCsv { .. } => ActionKind::ExportCsv,
        }
    }

    /// Validate parameters before any state is created.
    ///
    /// Target statuses and export fields are already constrained by their
    /// types; this checks the bounds the types cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::UpdateStatus { .. } => Ok(()),
            Self::AddTag { tags } => {
                if tags.is_empty() {
                    return Err(CoreError::Validation(
                        "At least one tag is required".to_string(),
                    ));
                }
                if tags.len() > MAX_TAGS_PER_ACTION {
                    return Err(CoreError::Validation(format!(
                        "At most {MAX_TAGS_PER_ACTION} tags may be added per action"
                    )));
                }
                for tag in tags {
                    if tag.trim().is_empty() {
                        return Err(CoreError::Validation(
                            "Tags must not be empty".to_string(),
                        ));
                    }
                    if tag.len() > MAX_TAG_LENGTH {
                        return Err(CoreError::Validation(format!(
                            "Tag '{tag}' exceeds maximum length of {MAX_TAG_LENGTH}"
                        )));
                    }
                }
                Ok(())
            }
            Self::AddNote { note, .. } => {
                if note.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "Note text must not be empty".to_string(),
                    ));
                }
                if note.len() > MAX_NOTE_LENGTH {
                    return Err(CoreError::Validation(format!(
                        "Note exceeds maximum length of {MAX_NOTE_LENGTH}"
                    )));
                }
                Ok(())
            }
            Self::ExportCsv { .. } => Ok(()),
        }
    }

    /// Human-readable summary used as the draft preview line.
    pub fn describe(&self, count: usize) -> String {
        match self {
            Self::UpdateStatus { status, notify } => {
                let suffix = if *notify {
                    ""
                } else {
                    " (customer notifications suppressed)"
                };
                format!("Set status to '{status}' for {count} orders{suffix}")
            }
            Self::AddTag { tags } => {
                format!("Add tags '{}' to {count} orders", tags.join(", "))
            }
            Self::AddNote { customer_note, .. } => {
                let visibility = if *customer_note {
                    " (visible to customer)"
                } else {
                    ""
                };
                format!("Add a note to {count} orders{visibility}")
            }
            Self::ExportCsv { fields } => {
                let field_count = crate::csv::effective_fields(fields).len();
                format!("Export {count} orders to CSV ({field_count} fields)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- ActionKind -----------------------------------------------------------

    #[test]
    fn kind_round_trip() {
        for kind in &[
            ActionKind::UpdateStatus,
            ActionKind::AddTag,
            ActionKind::AddNote,
            ActionKind::ExportCsv,
        ] {
            assert_eq!(ActionKind::from_str_value(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn unknown_kind_rejected() {
        let result = ActionKind::from_str_value("delete_orders");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("delete_orders"));
    }

    #[test]
    fn only_export_is_non_mutating() {
        assert!(ActionKind::UpdateStatus.is_mutating());
        assert!(ActionKind::AddTag.is_mutating());
        assert!(ActionKind::AddNote.is_mutating());
        assert!(!ActionKind::ExportCsv.is_mutating());
    }

    // -- Deserialization boundary ---------------------------------------------

    #[test]
    fn action_payload_deserializes_by_tag() {
        let action: BulkAction = serde_json::from_value(serde_json::json!({
            "action": "update_status",
            "status": "completed",
        }))
        .unwrap();
        assert!(matches!(
            action,
            BulkAction::UpdateStatus {
                status: OrderStatus::Completed,
                notify: false,
            }
        ));
    }

    #[test]
    fn unknown_action_tag_fails_deserialization() {
        let result = serde_json::from_value::<BulkAction>(serde_json::json!({
            "action": "refund_all",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_target_status_fails_deserialization() {
        let result = serde_json::from_value::<BulkAction>(serde_json::json!({
            "action": "update_status",
            "status": "shipped",
        }));
        assert!(result.is_err());
    }

    // -- validate -------------------------------------------------------------

    #[test]
    fn empty_tag_list_rejected() {
        let action = BulkAction::AddTag { tags: vec![] };
        assert!(action.validate().is_err());
    }

    #[test]
    fn blank_tag_rejected() {
        let action = BulkAction::AddTag {
            tags: vec!["vip".into(), "  ".into()],
        };
        assert!(action.validate().is_err());
    }

    #[test]
    fn too_many_tags_rejected() {
        let tags = (0..MAX_TAGS_PER_ACTION + 1).map(|i| format!("t{i}")).collect();
        assert!(BulkAction::AddTag { tags }.validate().is_err());
    }

    #[test]
    fn blank_note_rejected() {
        let action = BulkAction::AddNote {
            note: "   ".into(),
            customer_note: false,
        };
        assert!(action.validate().is_err());
    }

    #[test]
    fn oversized_note_rejected() {
        let action = BulkAction::AddNote {
            note: "x".repeat(MAX_NOTE_LENGTH + 1),
            customer_note: false,
        };
        assert!(action.validate().is_err());
    }

    #[test]
    fn well_formed_actions_accepted() {
        assert!(BulkAction::UpdateStatus {
            status: OrderStatus::Completed,
            notify: false,
        }
        .validate()
        .is_ok());
        assert!(BulkAction::AddTag {
            tags: vec!["vip".into()],
        }
        .validate()
        .is_ok());
        assert!(BulkAction::ExportCsv { fields: vec![] }.validate().is_ok());
    }

    // -- describe -------------------------------------------------------------

    #[test]
    fn describe_update_status() {
        let action = BulkAction::UpdateStatus {
            status: OrderStatus::Completed,
            notify: false,
        };
        assert_eq!(
            action.describe(3),
            "Set status to 'completed' for 3 orders (customer notifications suppressed)"
        );
    }

    #[test]
    fn describe_add_tag() {
        let action = BulkAction::AddTag {
            tags: vec!["vip".into(), "priority".into()],
        };
        assert_eq!(action.describe(12), "Add tags 'vip, priority' to 12 orders");
    }
}
