//! Collaborator interfaces to the commerce platform and the job queue.
//!
//! The engine never talks to the platform directly; every lookup and
//! mutation goes through [`OrderGateway`], and deferred execution goes
//! through [`JobScheduler`]. Both are injected at construction.

use async_trait::async_trait;
use storepilot_core::criteria::SelectionCriteria;
use storepilot_core::error::CoreError;
use storepilot_core::order::{Order, OrderStatus, Product};
use storepilot_core::types::{NoteId, OrderId, ProductId, RefundId};

/// Read and mutate orders and products on the commerce platform.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, CoreError>;

    /// Batched lookup. Implementations should resolve the whole chunk in
    /// one round trip; ids that do not resolve are simply absent from the
    /// result, not errors.
    async fn find_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, CoreError>;

    /// Ids of orders matching `criteria`, at most `limit` of them.
    async fn query(
        &self,
        criteria: &SelectionCriteria,
        limit: usize,
    ) -> Result<Vec<OrderId>, CoreError>;

    /// Transition an order's status. `notify` controls whether downstream
    /// customer notifications fire.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        notify: bool,
    ) -> Result<(), CoreError>;

    /// Replace an order's tag set.
    async fn set_tags(&self, id: OrderId, tags: &[String]) -> Result<(), CoreError>;

    /// Append a note, attributed to `author`. Returns the created note id.
    async fn add_note(
        &self,
        id: OrderId,
        text: &str,
        author: &str,
        customer_note: bool,
    ) -> Result<NoteId, CoreError>;

    /// Delete a previously created note.
    async fn delete_note(&self, id: OrderId, note_id: NoteId) -> Result<(), CoreError>;

    /// Issue a refund against an order.
    async fn refund(
        &self,
        id: OrderId,
        amount: f64,
        reason: &str,
    ) -> Result<RefundId, CoreError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, CoreError>;

    /// Set a product's stock quantity.
    async fn update_stock(&self, id: ProductId, quantity: i64) -> Result<(), CoreError>;
}

/// Hand a job id to the external execution infrastructure.
///
/// Fire-and-forget: the engine has no callback contract beyond "the job id
/// will eventually be executed". The job record itself is consumed via
/// claim, so a scheduler that delivers an id twice executes it once.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    async fn enqueue(&self, job_id: &str) -> Result<(), CoreError>;
}
