//! Draft model: a staged, unconfirmed mutation.

use serde::{Deserialize, Serialize};
use storepilot_core::error::CoreError;
use storepilot_core::types::Timestamp;

/// Draft kind discriminator.
///
/// The kind is part of the storage key, so a draft created as one kind can
/// never be claimed as another — a cross-kind confirmation attempt simply
/// reads as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    Refund,
    StatusUpdate,
    StockUpdate,
    BulkAction,
}

impl DraftKind {
    /// Convert from the wire string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "refund" => Ok(Self::Refund),
            "status_update" => Ok(Self::StatusUpdate),
            "stock_update" => Ok(Self::StockUpdate),
            "bulk_action" => Ok(Self::BulkAction),
            _ => Err(CoreError::Validation(format!(
                "Unknown draft kind '{s}'. Must be one of: refund, status_update, stock_update, bulk_action"
            ))),
        }
    }

    /// Convert to the wire string value (also used in storage keys).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::StatusUpdate => "status_update",
            Self::StockUpdate => "stock_update",
            Self::BulkAction => "bulk_action",
        }
    }
}

/// A staged mutation awaiting explicit confirmation.
///
/// Consumed by at most one successful claim; destroyed the instant a
/// confirmation claims it, before the underlying mutation is attempted, so
/// a failed mutation never leaves a re-claimable draft behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub kind: DraftKind,
    /// Action-specific payload, deserialized by the confirming operation.
    pub payload: serde_json::Value,
    /// Human-readable summary shown to the confirming user.
    pub preview: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}
