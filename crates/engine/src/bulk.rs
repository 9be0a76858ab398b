//! Bulk action engine: prepare → confirm → execute.
//!
//! The lifecycle is `selected → draft_prepared → claimed → {running|queued}
//! → completed`. The single guarded transition is `draft_prepared →
//! claimed`, backed by the draft store's atomic claim; everything before it
//! is free to fail without leaving state behind, and everything after it is
//! reported through the progress record rather than unwound.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use storepilot_core::actions::{BulkAction, LOOKUP_CHUNK_SIZE, MAX_BATCH_SIZE};
use storepilot_core::error::CoreError;
use storepilot_core::order::{Order, OrderStatus};
use storepilot_core::types::{new_token, ActorContext, OrderId, Timestamp};
use storepilot_store::models::draft::DraftKind;
use storepilot_store::models::job::BulkJob;
use storepilot_store::models::progress::{ExportArtifact, Progress};
use storepilot_store::models::rollback::RollbackRecord;
use storepilot_store::{
    DraftStore, JobStore, KvStore, ProgressStore, ProgressTracker, RollbackStore,
};

use crate::config::EngineConfig;
use crate::executors::{executor_for, ApplyOutcome};
use crate::gateway::{JobScheduler, OrderGateway};

/// Payload staged inside a `bulk_action` draft.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDraftPayload {
    pub order_ids: Vec<OrderId>,
    pub action: BulkAction,
    /// Each target's status at draft time; compared again at confirm time
    /// for status-changing actions.
    pub statuses_at_draft: BTreeMap<OrderId, OrderStatus>,
}

/// What `prepare` hands back for the user to confirm.
#[derive(Debug, Clone, Serialize)]
pub struct DraftPreview {
    pub draft_id: String,
    pub preview: String,
    pub order_count: usize,
    pub expires_at: Timestamp,
}

/// What a confirmed draft turned into.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Executed inline; the final progress snapshot is included, with the
    /// rollback handle for undoing the completed action.
    Completed {
        progress: Progress,
        rollback_id: String,
    },
    /// Deferred to the scheduler; poll `progress_id`.
    Queued {
        job_id: String,
        progress_id: String,
        rollback_id: String,
    },
}

/// Orchestrates bulk drafts from preparation through execution.
pub struct BulkEngine {
    gateway: Arc<dyn OrderGateway>,
    scheduler: Option<Arc<dyn JobScheduler>>,
    drafts: DraftStore,
    jobs: JobStore,
    progress: ProgressStore,
    rollbacks: RollbackStore,
    config: EngineConfig,
}

impl BulkEngine {
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        kv: Arc<dyn KvStore>,
        scheduler: Option<Arc<dyn JobScheduler>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            scheduler,
            drafts: DraftStore::new(Arc::clone(&kv), config.draft_ttl),
            jobs: JobStore::new(Arc::clone(&kv), config.record_ttl),
            progress: ProgressStore::new(Arc::clone(&kv), config.record_ttl),
            rollbacks: RollbackStore::new(kv, config.record_ttl),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Prepare
    // -----------------------------------------------------------------------

    /// Validate a proposed bulk action and stage it as a draft.
    ///
    /// Rejections happen before any record is written: parameter
    /// validation, batch bounds, and full resolution of every target id —
    /// a single unresolved id aborts with the complete missing list.
    pub async fn prepare(
        &self,
        actor: &ActorContext,
        order_ids: &[OrderId],
        action: BulkAction,
    ) -> Result<DraftPreview, CoreError> {
        action.validate()?;

        let ids = dedup_preserving_order(order_ids);
        if ids.is_empty() {
            return Err(CoreError::Validation(
                "At least one order id is required".to_string(),
            ));
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(CoreError::LimitExceeded {
                count: ids.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let orders = self.resolve_orders(&ids).await?;
        let missing: Vec<OrderId> = ids
            .iter()
            .copied()
            .filter(|id| !orders.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::OrdersNotFound { order_ids: missing });
        }

        let statuses_at_draft: BTreeMap<OrderId, OrderStatus> =
            orders.iter().map(|(id, o)| (*id, o.status)).collect();

        let order_count = ids.len();
        let preview = action.describe(order_count);
        let payload = BulkDraftPayload {
            order_ids: ids,
            action,
            statuses_at_draft,
        };
        let payload = serde_json::to_value(&payload)
            .map_err(|e| CoreError::Storage(format!("draft payload could not be encoded: {e}")))?;

        let draft = self
            .drafts
            .create(actor, DraftKind::BulkAction, payload, preview.clone())
            .await?;

        tracing::info!(
            draft_id = %draft.id,
            principal = %actor.principal,
            order_count,
            "Bulk draft prepared",
        );

        Ok(DraftPreview {
            draft_id: draft.id,
            preview,
            order_count,
            expires_at: draft.expires_at,
        })
    }

    /// Non-destructive draft read for preview endpoints.
    pub async fn preview(
        &self,
        actor: &ActorContext,
        draft_id: &str,
    ) -> Result<Option<DraftPreview>, CoreError> {
        let draft = self.drafts.load(actor, DraftKind::BulkAction, draft_id).await?;
        Ok(draft.map(|d| DraftPreview {
            draft_id: d.id.clone(),
            preview: d.preview.clone(),
            order_count: payload_count_of(&d.payload),
            expires_at: d.expires_at,
        }))
    }

    /// Explicitly discard a prepared draft.
    pub async fn cancel(&self, actor: &ActorContext, draft_id: &str) -> Result<(), CoreError> {
        self.drafts.cancel(actor, DraftKind::BulkAction, draft_id).await
    }

    /// Poll a job's progress record.
    pub async fn progress(
        &self,
        actor: &ActorContext,
        progress_id: &str,
    ) -> Result<Option<Progress>, CoreError> {
        self.progress.get(&actor.principal, progress_id).await
    }

    // -----------------------------------------------------------------------
    // Confirm
    // -----------------------------------------------------------------------

    /// Confirm a prepared draft.
    ///
    /// The claim is the at-most-once gate: of N concurrent confirmations
    /// exactly one proceeds and the rest read `NotFound` — the same answer
    /// an expired or never-issued draft id gets.
    pub async fn confirm(
        &self,
        actor: &ActorContext,
        draft_id: &str,
    ) -> Result<ConfirmOutcome, CoreError> {
        let draft = self
            .drafts
            .claim(actor, DraftKind::BulkAction, draft_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Draft",
                id: draft_id.to_string(),
            })?;

        let payload: BulkDraftPayload = serde_json::from_value(draft.payload)
            .map_err(|e| CoreError::Storage(format!("corrupt draft payload: {e}")))?;

        // For status-changing actions, any drift between draft time and now
        // invalidates what the user approved. The draft is already consumed;
        // the caller must prepare a fresh one.
        if matches!(payload.action, BulkAction::UpdateStatus { .. }) {
            let current = self.resolve_orders(&payload.order_ids).await?;
            let mut drifted: Vec<OrderId> = Vec::new();
            for (id, status) in &payload.statuses_at_draft {
                if current.get(id).map(|o| o.status) != Some(*status) {
                    drifted.push(*id);
                }
            }
            if !drifted.is_empty() {
                return Err(CoreError::Conflict {
                    message: "Order status changed since the draft was prepared; prepare a new draft"
                        .to_string(),
                    ids: drifted,
                });
            }
        }

        let now = Utc::now();
        let order_count = payload.order_ids.len();
        let kind = payload.action.kind();

        let progress = Progress::queued(new_token(), kind, order_count, now);
        let record_ttl = chrono::Duration::from_std(self.config.record_ttl)
            .map_err(|e| CoreError::Storage(format!("record ttl out of range: {e}")))?;
        let rollback = RollbackRecord::empty(new_token(), kind, now, now + record_ttl);
        let job = BulkJob {
            id: new_token(),
            actor: actor.clone(),
            order_ids: payload.order_ids,
            action: payload.action,
            draft_id: draft_id.to_string(),
            progress_id: progress.id.clone(),
            rollback_id: rollback.id.clone(),
            created_at: now,
        };

        self.progress.put(&actor.principal, &progress).await?;
        self.rollbacks.put(&actor.principal, &rollback).await?;
        self.jobs.create(&job).await?;

        if order_count > self.config.async_threshold {
            if let Some(scheduler) = &self.scheduler {
                scheduler.enqueue(&job.id).await?;
                tracing::info!(
                    job_id = %job.id,
                    progress_id = %job.progress_id,
                    order_count,
                    "Bulk job queued for deferred execution",
                );
                return Ok(ConfirmOutcome::Queued {
                    job_id: job.id,
                    progress_id: job.progress_id,
                    rollback_id: job.rollback_id,
                });
            }
        }

        let rollback_id = job.rollback_id.clone();
        let progress = self.execute(&job.id).await?;
        Ok(ConfirmOutcome::Completed {
            progress,
            rollback_id,
        })
    }

    // -----------------------------------------------------------------------
    // Execute
    // -----------------------------------------------------------------------

    /// Execute a bulk job by id. Shared by the inline confirm path and by
    /// scheduler-driven workers; the job record is consumed first, so a
    /// duplicate delivery of the same id reads `NotFound` and runs nothing.
    pub async fn execute(&self, job_id: &str) -> Result<Progress, CoreError> {
        let job = self
            .jobs
            .claim(job_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Job",
                id: job_id.to_string(),
            })?;
        let principal = job.actor.principal.clone();

        let progress = self
            .progress
            .get(&principal, &job.progress_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Progress",
                id: job.progress_id.clone(),
            })?;
        let mut rollback = self
            .rollbacks
            .get(&principal, &job.rollback_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Rollback record",
                id: job.rollback_id.clone(),
            })?;

        let mut tracker = ProgressTracker::new(
            self.progress.clone(),
            principal.clone(),
            progress,
            self.config.progress_write_interval,
        );
        tracker.mark_running().await?;

        // Resolve order state in chunks ahead of the per-item loop. A
        // failed chunk leaves its ids unresolved; they are counted as
        // per-item failures below rather than aborting the batch.
        let mut orders: HashMap<OrderId, Order> = HashMap::with_capacity(job.order_ids.len());
        for chunk in job.order_ids.chunks(LOOKUP_CHUNK_SIZE) {
            match self.gateway.find_by_ids(chunk).await {
                Ok(found) => orders.extend(found.into_iter().map(|o| (o.id, o))),
                Err(e) => tracing::warn!(
                    job_id = %job.id,
                    chunk_size = chunk.len(),
                    error = %e,
                    "Order lookup chunk failed; its orders will be reported as failures",
                ),
            }
        }

        let executor = executor_for(job.action.kind(), Arc::clone(&self.gateway));
        let mut rows: Vec<Vec<String>> = Vec::new();

        for id in &job.order_ids {
            let order = match orders.get(id) {
                Some(order) => order,
                None => {
                    tracker.item_failed(*id, "Order could not be resolved").await;
                    continue;
                }
            };
            match executor.apply(order, &job.action, &job.actor).await {
                Ok(ApplyOutcome::Mutated { prior }) => {
                    rollback.orders.insert(*id, prior);
                    tracker.item_succeeded().await;
                }
                Ok(ApplyOutcome::Exported { row }) => {
                    rows.push(row);
                    tracker.item_succeeded().await;
                }
                Err(e) => {
                    tracker.item_failed(*id, e.to_string()).await;
                }
            }
        }

        let artifact = match &job.action {
            BulkAction::ExportCsv { fields } => {
                let fields = storepilot_core::csv::effective_fields(fields);
                Some(ExportArtifact {
                    filename: format!("orders-export-{}.csv", job.id),
                    content_type: "text/csv; charset=utf-8".to_string(),
                    content: storepilot_core::csv::render_document(&fields, &rows),
                })
            }
            _ => None,
        };

        self.rollbacks.put(&principal, &rollback).await?;
        tracker.complete(artifact).await?;

        let progress = tracker.into_progress();
        tracing::info!(
            job_id = %job.id,
            progress_id = %progress.id,
            processed = progress.processed,
            updated = progress.updated,
            failed = progress.failed,
            "Bulk job completed",
        );
        Ok(progress)
    }

    async fn resolve_orders(
        &self,
        ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Order>, CoreError> {
        let mut orders = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
            let found = self.gateway.find_by_ids(chunk).await?;
            orders.extend(found.into_iter().map(|o| (o.id, o)));
        }
        Ok(orders)
    }
}

/// Deduplicate ids, keeping the first occurrence in place.
fn dedup_preserving_order(ids: &[OrderId]) -> Vec<OrderId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn payload_count_of(payload: &serde_json::Value) -> usize {
    payload
        .get("order_ids")
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_preserving_order(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
