//! Engine configuration.
//!
//! Tunables load from environment variables with defaults suitable for
//! local development; hard safety caps (batch size, error itemization)
//! live as constants in `storepilot_core::actions` and are not tunable.

use std::time::Duration;

/// Runtime tunables for the draft and bulk pipelines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a staged draft stays claimable.
    pub draft_ttl: Duration,
    /// How long job, progress, and rollback records stay readable.
    pub record_ttl: Duration,
    /// Order count above which confirmation defers to the scheduler.
    pub async_threshold: usize,
    /// Minimum interval between unforced progress writes.
    pub progress_write_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            draft_ttl: Duration::from_secs(300),
            record_ttl: Duration::from_secs(86_400),
            async_threshold: 50,
            progress_write_interval: Duration::from_millis(2_000),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default  |
    /// |------------------------------|----------|
    /// | `DRAFT_TTL_SECS`             | `300`    |
    /// | `RECORD_TTL_SECS`            | `86400`  |
    /// | `ASYNC_THRESHOLD`            | `50`     |
    /// | `PROGRESS_WRITE_INTERVAL_MS` | `2000`   |
    pub fn from_env() -> Self {
        let draft_ttl_secs: u64 = std::env::var("DRAFT_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("DRAFT_TTL_SECS must be a valid u64");

        let record_ttl_secs: u64 = std::env::var("RECORD_TTL_SECS")
            .unwrap_or_else(|_| "86400".into())
            .parse()
            .expect("RECORD_TTL_SECS must be a valid u64");

        let async_threshold: usize = std::env::var("ASYNC_THRESHOLD")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .expect("ASYNC_THRESHOLD must be a valid usize");

        let progress_write_interval_ms: u64 = std::env::var("PROGRESS_WRITE_INTERVAL_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("PROGRESS_WRITE_INTERVAL_MS must be a valid u64");

        Self {
            draft_ttl: Duration::from_secs(draft_ttl_secs),
            record_ttl: Duration::from_secs(record_ttl_secs),
            async_threshold,
            progress_write_interval: Duration::from_millis(progress_write_interval_ms),
        }
    }
}
