//! End-to-end test of deferred execution through the in-process scheduler.

use std::sync::Arc;
use std::time::Duration;

use storepilot_core::actions::BulkAction;
use storepilot_core::order::OrderStatus;
use storepilot_core::types::ActorContext;
use storepilot_engine::bulk::ConfirmOutcome;
use storepilot_engine::gateway::OrderGateway;
use storepilot_engine::testing::{make_order, FakeGateway};
use storepilot_engine::{BulkEngine, EngineConfig};
use storepilot_store::models::progress::ProgressStatus;
use storepilot_store::{KvStore, MemoryStore};
use storepilot_worker::{JobRunner, TokioScheduler};
use tokio_util::sync::CancellationToken;

fn actor() -> ActorContext {
    ActorContext::new("user-1", "Jo")
}

fn config() -> EngineConfig {
    EngineConfig {
        draft_ttl: Duration::from_secs(300),
        record_ttl: Duration::from_secs(86_400),
        async_threshold: 50,
        progress_write_interval: Duration::from_millis(0),
    }
}

#[tokio::test]
async fn queued_job_is_executed_by_the_runner() {
    let gateway = Arc::new(FakeGateway::new());
    let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    for id in 1..=200 {
        gateway.insert_order(make_order(id, OrderStatus::Processing, 10.0));
    }

    let (scheduler, rx) = TokioScheduler::channel();
    let engine = Arc::new(BulkEngine::new(
        Arc::clone(&gateway) as Arc<dyn OrderGateway>,
        Arc::clone(&kv),
        Some(Arc::new(scheduler)),
        config(),
    ));
    let runner = JobRunner::new(rx, Arc::clone(&engine));

    let cancel = CancellationToken::new();
    let runner_handle = tokio::spawn(runner.run(cancel.clone()));

    let ids: Vec<i64> = (1..=200).collect();
    let preview = engine
        .prepare(
            &actor(),
            &ids,
            BulkAction::UpdateStatus {
                status: OrderStatus::Completed,
                notify: false,
            },
        )
        .await
        .unwrap();
    let outcome = engine.confirm(&actor(), &preview.draft_id).await.unwrap();
    let progress_id = match outcome {
        ConfirmOutcome::Queued { progress_id, .. } => progress_id,
        ConfirmOutcome::Completed { .. } => panic!("large batch must defer"),
    };

    // Poll until the runner finishes the job.
    let mut completed = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let progress = engine
            .progress(&actor(), &progress_id)
            .await
            .unwrap()
            .unwrap();
        if progress.status == ProgressStatus::Completed {
            assert_eq!(progress.processed, 200);
            assert_eq!(progress.updated, 200);
            completed = true;
            break;
        }
    }
    assert!(completed, "runner never completed the job");
    assert_eq!(gateway.order(200).unwrap().status, OrderStatus::Completed);

    cancel.cancel();
    runner_handle.await.unwrap();
}

#[tokio::test]
async fn runner_stops_on_cancellation() {
    let gateway = Arc::new(FakeGateway::new());
    let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let engine = Arc::new(BulkEngine::new(
        Arc::clone(&gateway) as Arc<dyn OrderGateway>,
        kv,
        None,
        config(),
    ));
    let (_scheduler, rx) = TokioScheduler::channel();
    let runner = JobRunner::new(rx, engine);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(runner.run(cancel.clone()));
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("runner must stop promptly after cancellation")
        .unwrap();
}
