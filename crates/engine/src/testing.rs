//! In-memory collaborators for tests and embedding experiments.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use storepilot_core::criteria::SelectionCriteria;
use storepilot_core::error::CoreError;
use storepilot_core::order::{Order, OrderStatus, Product};
use storepilot_core::types::{NoteId, OrderId, ProductId, RefundId};

use crate::gateway::{JobScheduler, OrderGateway};

/// Build a plain order for seeding a [`FakeGateway`].
pub fn make_order(id: OrderId, status: OrderStatus, total: f64) -> Order {
    Order {
        id,
        number: id.to_string(),
        status,
        total,
        currency: "USD".to_string(),
        customer_email: Some(format!("customer{id}@example.com")),
        country: Some("US".to_string()),
        tags: Vec::new(),
        date_created: Utc::now(),
    }
}

/// An in-memory [`OrderGateway`] with injectable per-order failures.
#[derive(Default)]
pub struct FakeGateway {
    orders: Mutex<HashMap<OrderId, Order>>,
    products: Mutex<HashMap<ProductId, Product>>,
    notes: Mutex<HashMap<NoteId, (OrderId, String)>>,
    refunds: Mutex<Vec<(OrderId, f64, String)>>,
    failing: Mutex<HashSet<OrderId>>,
    next_note_id: AtomicI64,
    next_refund_id: AtomicI64,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            next_note_id: AtomicI64::new(1),
            next_refund_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn insert_product(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    /// Make every mutation against `id` fail with a gateway error.
    pub fn fail_mutations_on(&self, id: OrderId) {
        self.failing.lock().unwrap().insert(id);
    }

    /// Let previously failing orders accept mutations again.
    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.lock().unwrap().get(&id).cloned()
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products.lock().unwrap().get(&id).cloned()
    }

    pub fn note_count(&self) -> usize {
        self.notes.lock().unwrap().len()
    }

    pub fn refunds(&self) -> Vec<(OrderId, f64, String)> {
        self.refunds.lock().unwrap().clone()
    }

    fn check_failing(&self, id: OrderId) -> Result<(), CoreError> {
        if self.failing.lock().unwrap().contains(&id) {
            return Err(CoreError::Gateway(format!(
                "simulated platform failure for order {id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderGateway for FakeGateway {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, CoreError> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, CoreError> {
        let orders = self.orders.lock().unwrap();
        Ok(ids.iter().filter_map(|id| orders.get(id).cloned()).collect())
    }

    async fn query(
        &self,
        criteria: &SelectionCriteria,
        limit: usize,
    ) -> Result<Vec<OrderId>, CoreError> {
        let orders = self.orders.lock().unwrap();
        let mut ids: Vec<OrderId> = orders
            .values()
            .filter(|o| criteria.matches(o))
            .map(|o| o.id)
            .collect();
        ids.sort_unstable();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        _notify: bool,
    ) -> Result<(), CoreError> {
        self.check_failing(id)?;
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "Order",
            id: id.to_string(),
        })?;
        order.status = status;
        Ok(())
    }

    async fn set_tags(&self, id: OrderId, tags: &[String]) -> Result<(), CoreError> {
        self.check_failing(id)?;
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "Order",
            id: id.to_string(),
        })?;
        order.tags = tags.to_vec();
        Ok(())
    }

    async fn add_note(
        &self,
        id: OrderId,
        text: &str,
        author: &str,
        _customer_note: bool,
    ) -> Result<NoteId, CoreError> {
        self.check_failing(id)?;
        let note_id = self.next_note_id.fetch_add(1, Ordering::SeqCst);
        self.notes
            .lock()
            .unwrap()
            .insert(note_id, (id, format!("{text} — {author}")));
        Ok(note_id)
    }

    async fn delete_note(&self, _id: OrderId, note_id: NoteId) -> Result<(), CoreError> {
        let mut notes = self.notes.lock().unwrap();
        notes.remove(&note_id).ok_or(CoreError::NotFound {
            entity: "Note",
            id: note_id.to_string(),
        })?;
        Ok(())
    }

    async fn refund(
        &self,
        id: OrderId,
        amount: f64,
        reason: &str,
    ) -> Result<RefundId, CoreError> {
        self.check_failing(id)?;
        self.refunds
            .lock()
            .unwrap()
            .push((id, amount, reason.to_string()));
        Ok(self.next_refund_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, CoreError> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn update_stock(&self, id: ProductId, quantity: i64) -> Result<(), CoreError> {
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "Product",
            id: id.to_string(),
        })?;
        product.stock_quantity = Some(quantity);
        Ok(())
    }
}

/// A [`JobScheduler`] that records enqueued ids without running anything.
#[derive(Default)]
pub struct RecordingScheduler {
    enqueued: Mutex<Vec<String>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueued(&self) -> Vec<String> {
        self.enqueued.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn enqueue(&self, job_id: &str) -> Result<(), CoreError> {
        self.enqueued.lock().unwrap().push(job_id.to_string());
        Ok(())
    }
}
