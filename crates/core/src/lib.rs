//! Domain types shared across the storepilot workspace.
//!
//! This crate has no internal dependencies and performs no I/O: errors,
//! order and action types, selection criteria parsing, and CSV rendering
//! are all pure so the store, engine, and worker crates can use them alike.

pub mod actions;
pub mod criteria;
pub mod csv;
pub mod error;
pub mod order;
pub mod types;
