//! Orchestration layer: selection, draft preparation, confirmation,
//! execution, and rollback of assistant-proposed operations.
//!
//! The engine owns no background machinery of its own — it is invoked by
//! independent request workers and, for deferred jobs, by whatever runs
//! behind the [`gateway::JobScheduler`] collaborator.

pub mod bulk;
pub mod config;
pub mod executors;
pub mod gateway;
pub mod ops;
pub mod rollback;
pub mod selection;
pub mod testing;

pub use bulk::{BulkEngine, ConfirmOutcome};
pub use config::EngineConfig;
pub use ops::OpsEngine;
pub use rollback::RollbackEngine;
pub use selection::SelectionEngine;
