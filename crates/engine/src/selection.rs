//! Criteria-based order selection.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use storepilot_core::actions::MAX_BATCH_SIZE;
use storepilot_core::criteria::{parse_text, SelectionCriteria};
use storepilot_core::error::CoreError;
use storepilot_core::order::OrderSummary;
use storepilot_core::types::OrderId;

use crate::gateway::OrderGateway;

/// Number of orders included in the illustrative preview sample.
pub const PREVIEW_SAMPLE_SIZE: usize = 5;

/// A bounded candidate set for a bulk action.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    /// Deduplicated candidate ids in ascending order, capped at the batch
    /// maximum.
    pub order_ids: Vec<OrderId>,
    /// First few matching orders, for preview rendering.
    pub sample: Vec<OrderSummary>,
    /// Whether the query matched more orders than the cap allows.
    pub capped: bool,
}

/// Turns criteria (structured or free text) into a bounded candidate list.
pub struct SelectionEngine {
    gateway: Arc<dyn OrderGateway>,
}

impl SelectionEngine {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    /// Select candidates for structured criteria.
    pub async fn select(&self, criteria: &SelectionCriteria) -> Result<Selection, CoreError> {
        // Query one past the cap so we can tell "exactly at the cap" from
        // "more than the cap".
        let mut order_ids = self.gateway.query(criteria, MAX_BATCH_SIZE + 1).await?;
        order_ids.sort_unstable();
        order_ids.dedup();

        let capped = order_ids.len() > MAX_BATCH_SIZE;
        order_ids.truncate(MAX_BATCH_SIZE);

        let sample_ids: Vec<OrderId> = order_ids
            .iter()
            .take(PREVIEW_SAMPLE_SIZE)
            .copied()
            .collect();
        let mut sample_orders = self.gateway.find_by_ids(&sample_ids).await?;
        sample_orders.sort_unstable_by_key(|o| o.id);
        let sample = sample_orders.iter().map(OrderSummary::from).collect();

        Ok(Selection {
            order_ids,
            sample,
            capped,
        })
    }

    /// Parse free text into criteria, then select. Returns the parsed
    /// criteria alongside the selection so the caller can echo its
    /// interpretation back to the user.
    pub async fn select_text(
        &self,
        text: &str,
    ) -> Result<(SelectionCriteria, Selection), CoreError> {
        let criteria = parse_text(text, Utc::now());
        let selection = self.select(&criteria).await?;
        Ok((criteria, selection))
    }
}
