//! Order, product, and status types as supplied by the platform gateway.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{OrderId, ProductId, Timestamp};

// ---------------------------------------------------------------------------
// Status vocabulary
// ---------------------------------------------------------------------------

/// Status strings as stored by the platform.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_ON_HOLD: &str = "on-hold";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_REFUNDED: &str = "refunded";
pub const STATUS_FAILED: &str = "failed";

/// All valid order status strings.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_PROCESSING,
    STATUS_ON_HOLD,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
    STATUS_REFUNDED,
    STATUS_FAILED,
];

/// An order status drawn from the platform's known status set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Convert from the platform string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_PROCESSING => Ok(Self::Processing),
            STATUS_ON_HOLD => Ok(Self::OnHold),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            STATUS_REFUNDED => Ok(Self::Refunded),
            STATUS_FAILED => Ok(Self::Failed),
            _ => Err(CoreError::Validation(format!(
                "Invalid order status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the platform string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Processing => STATUS_PROCESSING,
            Self::OnHold => STATUS_ON_HOLD,
            Self::Completed => STATUS_COMPLETED,
            Self::Cancelled => STATUS_CANCELLED,
            Self::Refunded => STATUS_REFUNDED,
            Self::Failed => STATUS_FAILED,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A platform order as supplied by the order gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order number (usually, but not always, the id).
    pub number: String,
    pub status: OrderStatus,
    pub total: f64,
    pub currency: String,
    pub customer_email: Option<String>,
    /// ISO 3166-1 alpha-2 billing country code.
    pub country: Option<String>,
    pub tags: Vec<String>,
    pub date_created: Timestamp,
}

/// Compact order view used in selection previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub number: String,
    pub status: OrderStatus,
    pub total: f64,
    pub customer_email: Option<String>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            number: order.number.clone(),
            status: order.status,
            total: order.total,
            customer_email: order.customer_email.clone(),
        }
    }
}

/// A platform product, as far as stock operations need to know it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    /// `None` when the product does not track stock.
    pub stock_quantity: Option<i64>,
    pub manages_stock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in VALID_STATUSES {
            let status = OrderStatus::from_str_value(s).unwrap();
            assert_eq!(status.as_str(), *s);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        let result = OrderStatus::from_str_value("shipped");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("shipped"));
    }

    #[test]
    fn status_serde_uses_platform_strings() {
        let json = serde_json::to_string(&OrderStatus::OnHold).unwrap();
        assert_eq!(json, "\"on-hold\"");
        let back: OrderStatus = serde_json::from_str("\"on-hold\"").unwrap();
        assert_eq!(back, OrderStatus::OnHold);
    }

    #[test]
    fn statuses_count() {
        assert_eq!(VALID_STATUSES.len(), 7);
    }
}
