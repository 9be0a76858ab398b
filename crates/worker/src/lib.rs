//! In-process job scheduling.
//!
//! [`TokioScheduler`] implements the engine's `JobScheduler` collaborator
//! with an unbounded channel, and [`JobRunner`] drains that channel and
//! executes each job. Deployments with external queue infrastructure
//! implement `JobScheduler` against it instead; the engine does not care
//! which side of the trait it is talking to.

use std::sync::Arc;

use async_trait::async_trait;
use storepilot_core::error::CoreError;
use storepilot_engine::gateway::JobScheduler;
use storepilot_engine::BulkEngine;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Channel-backed [`JobScheduler`].
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<String>,
}

impl TokioScheduler {
    /// Create a scheduler and the receiving end for a [`JobRunner`].
    ///
    /// The scheduler half goes into the engine at construction; the
    /// receiver half goes into the runner once the engine exists.
    pub fn channel() -> (TokioScheduler, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TokioScheduler { tx }, rx)
    }
}

#[async_trait]
impl JobScheduler for TokioScheduler {
    async fn enqueue(&self, job_id: &str) -> Result<(), CoreError> {
        self.tx
            .send(job_id.to_string())
            .map_err(|_| CoreError::Gateway("job queue is closed".to_string()))
    }
}

/// Drains scheduled job ids and executes them against the engine.
pub struct JobRunner {
    rx: mpsc::UnboundedReceiver<String>,
    engine: Arc<BulkEngine>,
}

impl JobRunner {
    pub fn new(rx: mpsc::UnboundedReceiver<String>, engine: Arc<BulkEngine>) -> Self {
        Self { rx, engine }
    }

    /// Run until the cancellation token fires or every scheduler handle is
    /// dropped. Jobs run one at a time; per-job failures are logged and the
    /// loop keeps going.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Job runner started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job runner shutting down");
                    break;
                }
                next = self.rx.recv() => {
                    let Some(job_id) = next else {
                        tracing::info!("Job queue closed; job runner stopping");
                        break;
                    };
                    self.execute(&job_id).await;
                }
            }
        }
    }

    async fn execute(&self, job_id: &str) {
        match self.engine.execute(job_id).await {
            Ok(progress) => tracing::info!(
                job_id,
                processed = progress.processed,
                updated = progress.updated,
                failed = progress.failed,
                "Scheduled job completed",
            ),
            // An already-consumed job id is a duplicate delivery, not a
            // failure worth alarming on.
            Err(CoreError::NotFound { .. }) => {
                tracing::warn!(job_id, "Scheduled job was already consumed; skipping")
            }
            Err(e) => tracing::error!(job_id, error = %e, "Scheduled job failed"),
        }
    }
}
