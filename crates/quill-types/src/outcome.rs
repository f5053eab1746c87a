/// Outcome and metrics types reported by the coalescing writer.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================
// Submission Outcomes
// ============================================================

/// How a successful submission relates to the bytes that reached disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// The caller's own content was written and published.
    Published,
    /// Newer content coalesced over the caller's and was published instead.
    Superseded,
}

/// Successful result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Whether the caller's own content or a newer one was written.
    pub disposition: Disposition,
    /// 1-based sequence number of the cycle that published the content.
    pub cycle: u64,
}

impl Completion {
    /// True if the caller's own bytes are what was published.
    pub fn is_published(&self) -> bool {
        self.disposition == Disposition::Published
    }
}

// ============================================================
// Writer Metrics
// ============================================================

/// Coarse state of a writer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriterPhase {
    /// No cycle is running and nothing is pending.
    Idle,
    /// A cycle is running; more content may be pending behind it.
    CycleRunning,
}

/// Metrics snapshot from a writer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterMetrics {
    /// Total calls to `submit`.
    pub submissions: u64,
    /// Submissions whose content was replaced before a cycle picked it up.
    pub superseded: u64,
    /// Cycles started.
    pub cycles_started: u64,
    /// Cycles that published successfully.
    pub cycles_succeeded: u64,
    /// Cycles that failed at the write or publish stage.
    pub cycles_failed: u64,
    /// When the last successful publish finished.
    pub last_published_at: Option<DateTime<Utc>>,
    /// Current writer state.
    pub phase: WriterPhase,
    /// Whether content is waiting for the running cycle to finish.
    pub pending: bool,
}
