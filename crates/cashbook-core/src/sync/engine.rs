//! Drains the offline queue to the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::client::TransactionSubmitter;
use crate::error::Result;
use crate::queue::QueueManager;

/// Per-run tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub success: usize,
    pub failed: usize,
}

impl SyncReport {
    pub const fn attempted(&self) -> usize {
        self.success + self.failed
    }
}

/// Why a sync request did no work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The device is offline
    Offline,
    /// Another run on the same engine is in flight
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Skipped(SkipReason),
}

impl SyncOutcome {
    /// Tally for this request; skipped requests count as `{0, 0}`.
    pub const fn report(self) -> SyncReport {
        match self {
            Self::Completed(report) => report,
            Self::Skipped(_) => SyncReport {
                success: 0,
                failed: 0,
            },
        }
    }
}

/// Forwards every unsynced record to a `TransactionSubmitter`.
///
/// Records are attempted one at a time in insertion order. A record is
/// deleted only after the server confirmed it, so a crash between the two
/// steps re-sends it on the next run (at-least-once). One failed record
/// never stops the rest of the batch.
pub struct SyncEngine<S> {
    queue: Arc<QueueManager>,
    submitter: S,
    running: AtomicBool,
}

struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: TransactionSubmitter> SyncEngine<S> {
    pub const fn new(queue: Arc<QueueManager>, submitter: S) -> Self {
        Self {
            queue,
            submitter,
            running: AtomicBool::new(false),
        }
    }

    pub const fn queue(&self) -> &Arc<QueueManager> {
        &self.queue
    }

    pub const fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Whether a run is currently in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one pass over the records unsynced at the moment the run starts.
    ///
    /// Records enqueued mid-run wait for the next pass. Returns
    /// `Skipped(AlreadyRunning)` without touching the queue if a pass is
    /// already in flight.
    pub async fn run(&self) -> Result<SyncOutcome> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::debug!("Sync already in progress, ignoring request");
            return Ok(SyncOutcome::Skipped(SkipReason::AlreadyRunning));
        };

        let snapshot = self.queue.list_unsynced().await?;
        if snapshot.is_empty() {
            return Ok(SyncOutcome::Completed(SyncReport::default()));
        }
        tracing::info!("Syncing {} transaction(s) to server", snapshot.len());

        let mut report = SyncReport::default();
        for record in snapshot {
            if let Err(error) = self.submitter.submit(&record.payload).await {
                tracing::warn!("Failed to sync transaction {}: {error}", record.id);
                report.failed += 1;
                continue;
            }

            // Accepted upstream; a failed delete means the record is sent again next run.
            match self.queue.remove(record.id).await {
                Ok(()) => report.success += 1,
                Err(error) => {
                    tracing::warn!(
                        "Transaction {} synced but could not be removed: {error}",
                        record.id
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Sync complete: {} succeeded, {} failed",
            report.success,
            report.failed
        );
        Ok(SyncOutcome::Completed(report))
    }
}
