//! Storage layer: the TTL key-value store contract, its in-memory and
//! Postgres backends, and the typed stores for drafts, bulk jobs, progress,
//! and rollback records.
//!
//! The key-value store is the only shared mutable resource in the system;
//! every typed store is a thin, stateless wrapper that owns a handle to it.

pub mod drafts;
pub mod jobs;
pub mod keys;
pub mod kv;
pub mod memory;
pub mod models;
pub mod pg;
pub mod progress;
pub mod rollback;

pub use drafts::DraftStore;
pub use jobs::JobStore;
pub use kv::{KvStore, StoreError};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use progress::{ProgressStore, ProgressTracker};
pub use rollback::RollbackStore;
