//! Single-order assistant operations: refund, status update, stock update.
//!
//! Each runs through the same draft-confirm pipeline as bulk actions: the
//! proposal is validated and staged with a captured at-draft snapshot, and
//! confirmation claims the draft, re-checks for drift, then mutates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storepilot_core::error::CoreError;
use storepilot_core::order::OrderStatus;
use storepilot_core::types::{ActorContext, OrderId, ProductId, RefundId, Timestamp};
use storepilot_store::models::draft::{Draft, DraftKind};
use storepilot_store::{DraftStore, KvStore};

use crate::config::EngineConfig;
use crate::gateway::OrderGateway;

// ---------------------------------------------------------------------------
// Draft payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct RefundDraftPayload {
    order_id: OrderId,
    amount: f64,
    reason: String,
    status_at_draft: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusDraftPayload {
    order_id: OrderId,
    new_status: OrderStatus,
    notify: bool,
    status_at_draft: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
struct StockDraftPayload {
    product_id: ProductId,
    new_quantity: i64,
    quantity_at_draft: Option<i64>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A staged single-order proposal awaiting confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedOp {
    pub draft_id: String,
    pub preview: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundResult {
    pub order_id: OrderId,
    pub refund_id: RefundId,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub order_id: OrderId,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockResult {
    pub product_id: ProductId,
    pub previous_quantity: Option<i64>,
    pub new_quantity: i64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Draft-confirm pipeline for the assistant's single-order proposals.
pub struct OpsEngine {
    gateway: Arc<dyn OrderGateway>,
    drafts: DraftStore,
}

impl OpsEngine {
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        kv: Arc<dyn KvStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            gateway,
            drafts: DraftStore::new(kv, config.draft_ttl),
        }
    }

    // -- refund -------------------------------------------------------------

    pub async fn prepare_refund(
        &self,
        actor: &ActorContext,
        order_id: OrderId,
        amount: f64,
        reason: &str,
    ) -> Result<PreparedOp, CoreError> {
        if amount <= 0.0 {
            return Err(CoreError::Validation(
                "Refund amount must be greater than zero".to_string(),
            ));
        }
        let order = self.find_order(order_id).await?;
        if amount > order.total {
            return Err(CoreError::Validation(format!(
                "Refund amount {amount:.2} exceeds order total {:.2}",
                order.total
            )));
        }
        if order.status == OrderStatus::Refunded {
            return Err(CoreError::Validation(format!(
                "Order #{} is already refunded",
                order.number
            )));
        }

        let preview = format!(
            "Refund {} {amount:.2} on order #{} ({reason})",
            order.currency, order.number
        );
        let payload = RefundDraftPayload {
            order_id,
            amount,
            reason: reason.to_string(),
            status_at_draft: order.status,
        };
        self.stage(actor, DraftKind::Refund, &payload, preview).await
    }

    pub async fn confirm_refund(
        &self,
        actor: &ActorContext,
        draft_id: &str,
    ) -> Result<RefundResult, CoreError> {
        let draft = self.claim(actor, DraftKind::Refund, draft_id).await?;
        let payload: RefundDraftPayload = decode_payload(draft)?;

        let order = self.find_order(payload.order_id).await?;
        if order.status != payload.status_at_draft {
            return Err(drift_conflict(payload.order_id));
        }

        let refund_id = self
            .gateway
            .refund(payload.order_id, payload.amount, &payload.reason)
            .await?;

        tracing::info!(
            order_id = payload.order_id,
            refund_id,
            amount = payload.amount,
            principal = %actor.principal,
            "Refund issued",
        );

        Ok(RefundResult {
            order_id: payload.order_id,
            refund_id,
            amount: payload.amount,
        })
    }

    // -- status update ------------------------------------------------------

    pub async fn prepare_status_update(
        &self,
        actor: &ActorContext,
        order_id: OrderId,
        new_status: OrderStatus,
        notify: bool,
    ) -> Result<PreparedOp, CoreError> {
        let order = self.find_order(order_id).await?;
        if order.status == new_status {
            return Err(CoreError::Validation(format!(
                "Order #{} already has status '{new_status}'",
                order.number
            )));
        }

        let preview = format!(
            "Change order #{} from '{}' to '{new_status}'",
            order.number, order.status
        );
        let payload = StatusDraftPayload {
            order_id,
            new_status,
            notify,
            status_at_draft: order.status,
        };
        self.stage(actor, DraftKind::StatusUpdate, &payload, preview)
            .await
    }

    pub async fn confirm_status_update(
        &self,
        actor: &ActorContext,
        draft_id: &str,
    ) -> Result<StatusResult, CoreError> {
        let draft = self.claim(actor, DraftKind::StatusUpdate, draft_id).await?;
        let payload: StatusDraftPayload = decode_payload(draft)?;

        let order = self.find_order(payload.order_id).await?;
        if order.status != payload.status_at_draft {
            return Err(drift_conflict(payload.order_id));
        }

        self.gateway
            .update_status(payload.order_id, payload.new_status, payload.notify)
            .await?;

        tracing::info!(
            order_id = payload.order_id,
            from = %payload.status_at_draft,
            to = %payload.new_status,
            principal = %actor.principal,
            "Order status updated",
        );

        Ok(StatusResult {
            order_id: payload.order_id,
            previous_status: payload.status_at_draft,
            new_status: payload.new_status,
        })
    }

    // -- stock update -------------------------------------------------------

    pub async fn prepare_stock_update(
        &self,
        actor: &ActorContext,
        product_id: ProductId,
        new_quantity: i64,
    ) -> Result<PreparedOp, CoreError> {
        if new_quantity < 0 {
            return Err(CoreError::Validation(
                "Stock quantity must not be negative".to_string(),
            ));
        }
        let product = self
            .gateway
            .find_product(product_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Product",
                id: product_id.to_string(),
            })?;
        if !product.manages_stock {
            return Err(CoreError::Validation(format!(
                "Product '{}' does not manage stock",
                product.name
            )));
        }

        let preview = match product.stock_quantity {
            Some(current) => format!(
                "Set stock of '{}' ({}) from {current} to {new_quantity}",
                product.name, product.sku
            ),
            None => format!(
                "Set stock of '{}' ({}) to {new_quantity}",
                product.name, product.sku
            ),
        };
        let payload = StockDraftPayload {
            product_id,
            new_quantity,
            quantity_at_draft: product.stock_quantity,
        };
        self.stage(actor, DraftKind::StockUpdate, &payload, preview)
            .await
    }

    pub async fn confirm_stock_update(
        &self,
        actor: &ActorContext,
        draft_id: &str,
    ) -> Result<StockResult, CoreError> {
        let draft = self.claim(actor, DraftKind::StockUpdate, draft_id).await?;
        let payload: StockDraftPayload = decode_payload(draft)?;

        let product = self
            .gateway
            .find_product(payload.product_id)
            .await?
            .ok_or_else(|| drift_conflict(payload.product_id))?;
        if product.stock_quantity != payload.quantity_at_draft {
            return Err(drift_conflict(payload.product_id));
        }

        self.gateway
            .update_stock(payload.product_id, payload.new_quantity)
            .await?;

        tracing::info!(
            product_id = payload.product_id,
            quantity = payload.new_quantity,
            principal = %actor.principal,
            "Stock updated",
        );

        Ok(StockResult {
            product_id: payload.product_id,
            previous_quantity: payload.quantity_at_draft,
            new_quantity: payload.new_quantity,
        })
    }

    // -- shared helpers -----------------------------------------------------

    async fn find_order(
        &self,
        order_id: OrderId,
    ) -> Result<storepilot_core::order::Order, CoreError> {
        self.gateway
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Order",
                id: order_id.to_string(),
            })
    }

    async fn stage<P: Serialize>(
        &self,
        actor: &ActorContext,
        kind: DraftKind,
        payload: &P,
        preview: String,
    ) -> Result<PreparedOp, CoreError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| CoreError::Storage(format!("draft payload could not be encoded: {e}")))?;
        let draft = self
            .drafts
            .create(actor, kind, payload, preview.clone())
            .await?;
        tracing::info!(
            draft_id = %draft.id,
            kind = kind.as_str(),
            principal = %actor.principal,
            "Draft prepared",
        );
        Ok(PreparedOp {
            draft_id: draft.id,
            preview,
            expires_at: draft.expires_at,
        })
    }

    async fn claim(
        &self,
        actor: &ActorContext,
        kind: DraftKind,
        draft_id: &str,
    ) -> Result<Draft, CoreError> {
        self.drafts
            .claim(actor, kind, draft_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Draft",
                id: draft_id.to_string(),
            })
    }
}

fn decode_payload<P: serde::de::DeserializeOwned>(draft: Draft) -> Result<P, CoreError> {
    serde_json::from_value(draft.payload)
        .map_err(|e| CoreError::Storage(format!("corrupt draft payload: {e}")))
}

fn drift_conflict(id: i64) -> CoreError {
    CoreError::Conflict {
        message: "State changed since the draft was prepared; prepare a new draft".to_string(),
        ids: vec![id],
    }
}
