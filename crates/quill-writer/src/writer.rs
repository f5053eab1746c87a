//! Coalescing writer implementation.
//!
//! Persists the latest submitted content to a single target file:
//! - At most one write cycle (staging write + atomic rename) in flight
//! - Submissions that arrive mid-cycle collapse into one pending slot,
//!   last write wins
//! - Every caller is resolved with the outcome of the cycle that carried
//!   their content (or newer content coalesced over it)
//!
//! State machine: Idle → CycleRunning → Idle, with the pending slot
//! orthogonal. A finished cycle with an occupied slot chains straight into
//! the next cycle.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use quill_types::config::WriterConfig;
use quill_types::errors::QuillError;
use quill_types::outcome::{Completion, Disposition, WriterMetrics, WriterPhase};
use quill_types::traits::StagingIo;

use crate::fs::TokioStagingIo;
use crate::staging::staging_path_for;

// ============================================================
// Completion signalling
// ============================================================

/// Outcome of one cycle, fanned out to every member of its group.
#[derive(Debug, Clone)]
struct CycleReport {
    cycle: u64,
    /// Ticket of the submission whose bytes the cycle wrote.
    ticket: u64,
    result: Result<(), QuillError>,
}

impl CycleReport {
    fn completion_for(&self, ticket: u64) -> Result<Completion, QuillError> {
        self.result.clone()?;
        let disposition = if ticket == self.ticket {
            Disposition::Published
        } else {
            Disposition::Superseded
        };
        Ok(Completion {
            disposition,
            cycle: self.cycle,
        })
    }
}

/// Resolved exactly once with the report of the group's cycle.
type Signal = watch::Sender<Option<CycleReport>>;
type Waiter = watch::Receiver<Option<CycleReport>>;

// ============================================================
// Writer state
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running { cycle: u64 },
}

/// The not-yet-started request. Its signal is shared by every caller whose
/// content passed through the slot.
struct PendingSlot {
    content: Vec<u8>,
    ticket: u64,
    signal: Signal,
}

/// Everything a driver needs to run one cycle and resolve its group.
struct CycleJob {
    cycle: u64,
    ticket: u64,
    content: Vec<u8>,
    signal: Signal,
}

struct WriterState {
    phase: Phase,
    /// `Some` only while `phase` is `Running`.
    pending: Option<PendingSlot>,
    submissions: u64,
    superseded: u64,
    cycles_started: u64,
    cycles_succeeded: u64,
    cycles_failed: u64,
    last_published_at: Option<DateTime<Utc>>,
}

impl WriterState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
            submissions: 0,
            superseded: 0,
            cycles_started: 0,
            cycles_succeeded: 0,
            cycles_failed: 0,
            last_published_at: None,
        }
    }

    /// Move into `Running` with a fresh cycle number.
    fn start_cycle(&mut self) -> u64 {
        self.cycles_started += 1;
        self.phase = Phase::Running {
            cycle: self.cycles_started,
        };
        self.cycles_started
    }

    /// Place content in the pending slot, replacing whatever was there, and
    /// return a waiter on the slot's shared signal.
    fn coalesce(&mut self, ticket: u64, content: Vec<u8>) -> Waiter {
        match &mut self.pending {
            Some(slot) => {
                slot.content = content;
                slot.ticket = ticket;
                self.superseded += 1;
                slot.signal.subscribe()
            }
            None => {
                let (signal, waiter) = watch::channel(None);
                self.pending = Some(PendingSlot {
                    content,
                    ticket,
                    signal,
                });
                waiter
            }
        }
    }

    fn record(&mut self, result: &Result<(), QuillError>) {
        match result {
            Ok(()) => {
                self.cycles_succeeded += 1;
                self.last_published_at = Some(Utc::now());
            }
            Err(_) => self.cycles_failed += 1,
        }
    }

    fn metrics(&self) -> WriterMetrics {
        WriterMetrics {
            submissions: self.submissions,
            superseded: self.superseded,
            cycles_started: self.cycles_started,
            cycles_succeeded: self.cycles_succeeded,
            cycles_failed: self.cycles_failed,
            last_published_at: self.last_published_at,
            phase: match self.phase {
                Phase::Idle => WriterPhase::Idle,
                Phase::Running { .. } => WriterPhase::CycleRunning,
            },
            pending: self.pending.is_some(),
        }
    }
}

struct Shared {
    target: PathBuf,
    staging: PathBuf,
    io: Arc<dyn StagingIo>,
    /// Never held across an `.await`.
    state: Mutex<WriterState>,
    /// `true` while the writer is idle. Updated under `state`.
    idle: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_cycle(&self, cycle: u64, content: &[u8]) -> Result<(), QuillError> {
        debug!(
            path = %self.target.display(),
            cycle,
            bytes = content.len(),
            "write cycle started"
        );

        self.io
            .write_all(&self.staging, content)
            .await
            .map_err(|e| QuillError::write(&self.staging, e))?;
        self.io
            .publish(&self.staging, &self.target)
            .await
            .map_err(|e| QuillError::publish(&self.staging, &self.target, e))?;

        debug!(path = %self.target.display(), cycle, "write cycle published");
        Ok(())
    }
}

// ============================================================
// CoalescingWriter
// ============================================================

/// Coalescing atomic writer bound to one target file.
///
/// Cheap to clone; clones share the same queue. Cycles run on a spawned tokio
/// task, so a caller that stops waiting (for example on an external timeout)
/// does not stop the I/O or stall other callers. Must be used from within a
/// tokio runtime.
///
/// Pending content is held in memory only. Await [`settled`](Self::settled)
/// before shutting down or it is lost.
#[derive(Clone)]
pub struct CoalescingWriter {
    shared: Arc<Shared>,
}

impl CoalescingWriter {
    /// Create a writer for `target` with the default configuration.
    pub fn new(target: impl Into<PathBuf>) -> Result<Self, QuillError> {
        Self::with_config(target, &WriterConfig::default())
    }

    /// Create a writer for `target` backed by the tokio filesystem.
    pub fn with_config(
        target: impl Into<PathBuf>,
        config: &WriterConfig,
    ) -> Result<Self, QuillError> {
        Self::with_io(target, config, Arc::new(TokioStagingIo::new(config)))
    }

    /// Create a writer for `target` using a custom staging I/O backend.
    ///
    /// Fails if the target has no file name or the configured staging naming
    /// is invalid.
    pub fn with_io(
        target: impl Into<PathBuf>,
        config: &WriterConfig,
        io: Arc<dyn StagingIo>,
    ) -> Result<Self, QuillError> {
        let target = target.into();
        let staging = staging_path_for(&target, &config.staging)?;
        let (idle, _) = watch::channel(true);

        Ok(Self {
            shared: Arc::new(Shared {
                target,
                staging,
                io,
                state: Mutex::new(WriterState::new()),
                idle,
            }),
        })
    }

    /// Persist `content` to the target.
    ///
    /// Resolves once a cycle has published content at least as new as this
    /// one: [`Disposition::Published`] if these bytes were written,
    /// [`Disposition::Superseded`] if a later submission replaced them first.
    /// Fails with the error of the cycle that carried the content.
    pub async fn submit(&self, content: impl Into<Vec<u8>>) -> Result<Completion, QuillError> {
        let content = content.into();

        let (ticket, waiter, job) = {
            let mut state = self.shared.lock();
            state.submissions += 1;
            let ticket = state.submissions;

            match state.phase {
                Phase::Idle => {
                    let cycle = state.start_cycle();
                    self.shared.idle.send_replace(false);
                    let (signal, waiter) = watch::channel(None);
                    let job = CycleJob {
                        cycle,
                        ticket,
                        content,
                        signal,
                    };
                    (ticket, waiter, Some(job))
                }
                Phase::Running { cycle } => {
                    let waiter = state.coalesce(ticket, content);
                    debug!(
                        path = %self.shared.target.display(),
                        running = cycle,
                        ticket,
                        "submission coalesced behind running cycle"
                    );
                    (ticket, waiter, None)
                }
            }
        };

        if let Some(job) = job {
            tokio::spawn(drive(Arc::clone(&self.shared), job));
        }

        await_outcome(waiter, ticket).await
    }

    /// Serialize `value` as pretty JSON with a trailing newline and submit it.
    pub async fn submit_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<Completion, QuillError> {
        let mut content = serde_json::to_vec_pretty(value)?;
        content.push(b'\n');
        self.submit(content).await
    }

    /// Wait until no cycle is running, nothing is pending, and every group
    /// has been resolved.
    pub async fn settled(&self) {
        let mut idle = self.shared.idle.subscribe();
        let _ = idle.wait_for(|idle| *idle).await;
    }

    /// The target file.
    pub fn path(&self) -> &Path {
        &self.shared.target
    }

    /// The staging file used by every cycle of this writer.
    pub fn staging_path(&self) -> &Path {
        &self.shared.staging
    }

    /// Whether a write cycle is currently running.
    pub fn is_busy(&self) -> bool {
        matches!(self.shared.lock().phase, Phase::Running { .. })
    }

    /// Get a snapshot of current metrics.
    pub fn metrics(&self) -> WriterMetrics {
        self.shared.lock().metrics()
    }
}

impl fmt::Debug for CoalescingWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoalescingWriter")
            .field("target", &self.shared.target)
            .field("staging", &self.shared.staging)
            .field("busy", &self.is_busy())
            .finish()
    }
}

// ============================================================
// Cycle driver
// ============================================================

/// Run cycles until the pending slot is empty after one finishes.
///
/// Only the task that moved the writer out of `Idle` runs this, so cycles of
/// one writer never overlap.
async fn drive(shared: Arc<Shared>, first: CycleJob) {
    let mut guard = DriverGuard {
        shared: &shared,
        armed: true,
    };
    let mut job = first;

    loop {
        let result = shared.run_cycle(job.cycle, &job.content).await;
        if let Err(e) = &result {
            warn!(path = %shared.target.display(), cycle = job.cycle, "write cycle failed: {e}");
        }

        let waiters = job.signal.receiver_count();
        let next = {
            let mut state = shared.lock();
            state.record(&result);
            let next = state.pending.take().map(|slot| CycleJob {
                cycle: state.start_cycle(),
                ticket: slot.ticket,
                content: slot.content,
                signal: slot.signal,
            });

            // Resolve the group before `idle` flips.
            job.signal.send_replace(Some(CycleReport {
                cycle: job.cycle,
                ticket: job.ticket,
                result,
            }));
            if next.is_none() {
                state.phase = Phase::Idle;
                shared.idle.send_replace(true);
            }
            next
        };
        debug!(
            path = %shared.target.display(),
            cycle = job.cycle,
            waiters,
            "completion group resolved"
        );

        match next {
            Some(next) => job = next,
            None => break,
        }
    }

    guard.armed = false;
}

/// Returns the writer to `Idle` if the driver ends mid-cycle (a panicking
/// I/O backend or runtime shutdown). Dropping the pending slot resolves its
/// waiters with [`QuillError::Abandoned`].
struct DriverGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for DriverGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.lock();
        let dropped = state.pending.take().is_some();
        state.phase = Phase::Idle;
        self.shared.idle.send_replace(true);
        warn!(
            path = %self.shared.target.display(),
            dropped_pending = dropped,
            "write cycle driver ended before completion"
        );
    }
}

async fn await_outcome(mut waiter: Waiter, ticket: u64) -> Result<Completion, QuillError> {
    let report = waiter
        .wait_for(Option::is_some)
        .await
        .map_err(|_| QuillError::Abandoned)?
        .clone();

    match report {
        Some(report) => report.completion_for(ticket),
        None => Err(QuillError::Abandoned),
    }
}

// ============================================================
// Tests
// ============================================================
