//! Tests for the criteria-based selection engine.

use std::sync::Arc;

use storepilot_core::actions::MAX_BATCH_SIZE;
use storepilot_core::criteria::SelectionCriteria;
use storepilot_core::order::OrderStatus;
use storepilot_engine::selection::PREVIEW_SAMPLE_SIZE;
use storepilot_engine::gateway::OrderGateway;
use storepilot_engine::testing::{make_order, FakeGateway};
use storepilot_engine::SelectionEngine;

fn fixtures() -> (Arc<FakeGateway>, SelectionEngine) {
    let gateway = Arc::new(FakeGateway::new());
    let engine = SelectionEngine::new(Arc::clone(&gateway) as Arc<dyn OrderGateway>);
    (gateway, engine)
}

#[tokio::test]
async fn selects_matching_orders_with_a_sample() {
    let (gateway, engine) = fixtures();
    for id in 1..=20 {
        gateway.insert_order(make_order(id, OrderStatus::Processing, 10.0 * id as f64));
    }
    for id in 21..=30 {
        gateway.insert_order(make_order(id, OrderStatus::Completed, 5.0));
    }

    let criteria = SelectionCriteria {
        statuses: vec![OrderStatus::Processing],
        ..Default::default()
    };
    let selection = engine.select(&criteria).await.unwrap();

    assert_eq!(selection.order_ids.len(), 20);
    assert!(!selection.capped);
    assert_eq!(selection.sample.len(), PREVIEW_SAMPLE_SIZE);
    assert_eq!(selection.sample[0].id, 1);
    assert!(selection
        .sample
        .iter()
        .all(|s| s.status == OrderStatus::Processing));
}

#[tokio::test]
async fn selection_is_capped_at_the_batch_maximum() {
    let (gateway, engine) = fixtures();
    for id in 1..=(MAX_BATCH_SIZE as i64 + 50) {
        gateway.insert_order(make_order(id, OrderStatus::Pending, 5.0));
    }

    let criteria = SelectionCriteria {
        statuses: vec![OrderStatus::Pending],
        ..Default::default()
    };
    let selection = engine.select(&criteria).await.unwrap();

    assert_eq!(selection.order_ids.len(), MAX_BATCH_SIZE);
    assert!(selection.capped);
}

#[tokio::test]
async fn free_text_selection_interprets_the_phrase() {
    let (gateway, engine) = fixtures();
    gateway.insert_order(make_order(1, OrderStatus::OnHold, 120.0));
    gateway.insert_order(make_order(2, OrderStatus::OnHold, 20.0));
    gateway.insert_order(make_order(3, OrderStatus::Completed, 200.0));

    let (criteria, selection) = engine
        .select_text("orders on hold over $100")
        .await
        .unwrap();

    assert_eq!(criteria.statuses, vec![OrderStatus::OnHold]);
    assert_eq!(criteria.min_total, Some(100.0));
    assert_eq!(selection.order_ids, vec![1]);
}

#[tokio::test]
async fn empty_result_is_not_an_error() {
    let (_gateway, engine) = fixtures();
    let selection = engine
        .select(&SelectionCriteria::default())
        .await
        .unwrap();
    assert!(selection.order_ids.is_empty());
    assert!(selection.sample.is_empty());
}
