//! Progress model: pollable execution status of a bulk job.

use serde::{Deserialize, Serialize};
use storepilot_core::actions::{ActionKind, MAX_COLLECTED_ERRORS};
use storepilot_core::error::CoreError;
use storepilot_core::types::{OrderId, Timestamp};

/// Lifecycle status of a bulk job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Queued,
    Running,
    Completed,
}

impl ProgressStatus {
    /// Convert from the wire string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Unknown progress status '{s}'. Must be one of: queued, running, completed"
            ))),
        }
    }

    /// Convert to the wire string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}

/// A single itemized execution error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub order_id: OrderId,
    pub message: String,
}

/// CSV artifact attached to a completed export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

/// Pollable, mutable execution status for a bulk job.
///
/// Counter invariants hold by construction: `processed <= order_count` and
/// `updated + failed <= processed`, and every counter is monotonic
/// non-decreasing over the life of the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: String,
    pub status: ProgressStatus,
    pub action: ActionKind,
    pub order_count: usize,
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
    /// Itemized errors, capped at [`MAX_COLLECTED_ERRORS`].
    pub errors: Vec<ItemError>,
    /// Set once failures stop being itemized; `failed` keeps the true total.
    pub truncated: bool,
    pub artifact: Option<ExportArtifact>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub last_updated: Timestamp,
}

impl Progress {
    /// A freshly queued record with zeroed counters.
    pub fn queued(id: String, action: ActionKind, order_count: usize, now: Timestamp) -> Self {
        Self {
            id,
            status: ProgressStatus::Queued,
            action,
            order_count,
            processed: 0,
            updated: 0,
            failed: 0,
            errors: Vec::new(),
            truncated: false,
            artifact: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            last_updated: now,
        }
    }

    /// Record one successfully processed item.
    pub fn item_succeeded(&mut self) {
        self.processed += 1;
        self.updated += 1;
    }

    /// Record one failed item, itemizing the error while under the cap.
    pub fn item_failed(&mut self, order_id: OrderId, message: impl Into<String>) {
        self.processed += 1;
        self.failed += 1;
        if self.errors.len() < MAX_COLLECTED_ERRORS {
            self.errors.push(ItemError {
                order_id,
                message: message.into(),
            });
        } else {
            self.truncated = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn progress(order_count: usize) -> Progress {
        Progress::queued("p1".into(), ActionKind::UpdateStatus, order_count, Utc::now())
    }

    #[test]
    fn status_round_trip() {
        for s in &[
            ProgressStatus::Queued,
            ProgressStatus::Running,
            ProgressStatus::Completed,
        ] {
            assert_eq!(ProgressStatus::from_str_value(s.as_str()).unwrap(), *s);
        }
    }

    #[test]
    fn counters_start_at_zero() {
        let p = progress(10);
        assert_eq!(p.processed, 0);
        assert_eq!(p.updated, 0);
        assert_eq!(p.failed, 0);
        assert!(p.errors.is_empty());
        assert!(!p.truncated);
    }

    #[test]
    fn success_and_failure_keep_invariants() {
        let mut p = progress(3);
        p.item_succeeded();
        p.item_failed(7, "boom");
        p.item_succeeded();
        assert_eq!(p.processed, 3);
        assert_eq!(p.updated, 2);
        assert_eq!(p.failed, 1);
        assert!(p.updated + p.failed <= p.processed);
        assert!(p.processed <= p.order_count);
    }

    #[test]
    fn errors_are_bounded_but_counters_are_not() {
        let mut p = progress(MAX_COLLECTED_ERRORS + 10);
        for i in 0..MAX_COLLECTED_ERRORS + 10 {
            p.item_failed(i as OrderId, "boom");
        }
        assert_eq!(p.errors.len(), MAX_COLLECTED_ERRORS);
        assert!(p.truncated);
        assert_eq!(p.failed, MAX_COLLECTED_ERRORS + 10);
    }

    #[test]
    fn under_the_cap_nothing_is_truncated() {
        let mut p = progress(MAX_COLLECTED_ERRORS);
        for i in 0..MAX_COLLECTED_ERRORS {
            p.item_failed(i as OrderId, "boom");
        }
        assert_eq!(p.errors.len(), MAX_COLLECTED_ERRORS);
        assert!(!p.truncated);
    }
}
