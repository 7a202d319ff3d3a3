//! Foreground sync coordinator.
//!
//! Tracks connectivity and the unsynced count, turns connectivity changes
//! into (debounced) sync runs, and tells the presentation layer what
//! happened. State flows out through a `watch` channel and one-off events
//! through a `broadcast` channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};

use super::background::{register_background_sync, BackgroundRegistrar, WorkerMessage};
use super::client::TransactionSubmitter;
use super::engine::{SkipReason, SyncEngine, SyncOutcome, SyncReport};
use crate::error::Result;
use crate::models::RecordId;
use crate::queue::QueueManager;

/// Delay between regaining connectivity and the automatic sync
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

const NOTICE_BUFFER: usize = 64;

/// Coordinator state as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Offline,
    OnlineIdle,
    OnlineSyncing,
}

/// Snapshot published on every change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub unsynced_count: u64,
    pub is_syncing: bool,
    pub is_online: bool,
}

impl QueueStatus {
    pub const fn state(&self) -> ConnectivityState {
        match (self.is_online, self.is_syncing) {
            (false, _) => ConnectivityState::Offline,
            (true, false) => ConnectivityState::OnlineIdle,
            (true, true) => ConnectivityState::OnlineSyncing,
        }
    }
}

/// One-off events for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    WentOnline,
    WentOffline,
    /// A transaction was parked locally
    SavedOffline { id: RecordId },
    SaveFailed { reason: String },
    /// A sync was requested while offline
    OfflineSyncRejected,
    /// A foreground pass finished
    BatchComplete { count: usize, failed: usize },
    /// The background worker finished a pass
    BackgroundComplete { count: usize },
    SyncFailed { reason: String },
}

/// Inputs that drive the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivitySignal {
    Online,
    Offline,
    SyncRequested,
    Worker(WorkerMessage),
}

pub struct SyncCoordinator<S> {
    engine: SyncEngine<S>,
    registrar: Option<Arc<dyn BackgroundRegistrar>>,
    settle_delay: Duration,
    online: AtomicBool,
    status: watch::Sender<QueueStatus>,
    notices: broadcast::Sender<SyncNotice>,
}

impl<S: TransactionSubmitter> SyncCoordinator<S> {
    pub fn new(queue: Arc<QueueManager>, submitter: S, initially_online: bool) -> Self {
        let (status, _) = watch::channel(QueueStatus {
            is_online: initially_online,
            ..QueueStatus::default()
        });
        let (notices, _) = broadcast::channel(NOTICE_BUFFER);

        Self {
            engine: SyncEngine::new(queue, submitter),
            registrar: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            online: AtomicBool::new(initially_online),
            status,
            notices,
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    #[must_use]
    pub fn with_registrar(mut self, registrar: Arc<dyn BackgroundRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub const fn queue(&self) -> &Arc<QueueManager> {
        self.engine.queue()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.notices.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<QueueStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> QueueStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectivityState {
        self.status().state()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn is_syncing(&self) -> bool {
        self.engine.is_running()
    }

    fn notify(&self, notice: SyncNotice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }

    fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::AcqRel);
        self.status.send_modify(|status| status.is_online = online);
        previous != online
    }

    /// Re-query the unsynced count and publish it.
    ///
    /// An unavailable store reads as an empty queue.
    pub async fn unsynced_count(&self) -> u64 {
        let count = match self.queue().count_unsynced().await {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!("Failed to get unsynced count: {error}");
                0
            }
        };
        self.status
            .send_modify(|status| status.unsynced_count = count);
        count
    }

    /// Park a transaction payload and ask for a background sync.
    pub async fn enqueue(&self, payload: Value) -> Result<RecordId> {
        match self.queue().enqueue(payload).await {
            Ok(id) => {
                self.unsynced_count().await;
                self.notify(SyncNotice::SavedOffline { id });
                register_background_sync(self.registrar.as_deref());
                Ok(id)
            }
            Err(error) => {
                self.notify(SyncNotice::SaveFailed {
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Drop records already marked synced and republish the count.
    pub async fn evict_synced(&self) -> Result<u64> {
        let removed = self.queue().evict_synced().await?;
        self.unsynced_count().await;
        Ok(removed)
    }

    /// Foreground sync of everything currently queued.
    ///
    /// Offline requests are rejected without touching the queue or the
    /// network. Concurrent requests are ignored while a pass is in flight.
    pub async fn sync_all(&self) -> Result<SyncOutcome> {
        if !self.is_online() {
            self.notify(SyncNotice::OfflineSyncRejected);
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }

        self.status.send_modify(|status| status.is_syncing = true);
        let outcome = self.engine.run().await;
        self.unsynced_count().await;
        let still_running = self.engine.is_running();
        self.status
            .send_modify(|status| status.is_syncing = still_running);

        match &outcome {
            Ok(SyncOutcome::Completed(SyncReport { success, failed })) => {
                if *success > 0 || *failed > 0 {
                    self.notify(SyncNotice::BatchComplete {
                        count: *success,
                        failed: *failed,
                    });
                }
            }
            Ok(SyncOutcome::Skipped(_)) => {}
            Err(error) => {
                tracing::error!("Sync failed: {error}");
                self.notify(SyncNotice::SyncFailed {
                    reason: error.to_string(),
                });
            }
        }
        outcome
    }

    /// Wait out the settle delay, then sync if still online and work remains.
    pub async fn settle_then_sync(&self) -> Option<SyncOutcome> {
        tokio::time::sleep(self.settle_delay).await;
        if !self.is_online() {
            tracing::debug!("Went offline during settle delay, skipping sync");
            return None;
        }

        let pending = self.unsynced_count().await;
        if pending == 0 {
            return None;
        }

        tracing::info!("Connection restored, syncing {pending} pending transaction(s)");
        self.sync_all().await.ok()
    }

    /// Pick up records queued behind the coordinator's back, such as by
    /// another process sharing the store file.
    ///
    /// While online and idle, pending work is handed to the background
    /// worker, or synced here when no worker is registered. Returns whether
    /// any work was scheduled or run.
    pub async fn sync_pending(&self) -> bool {
        if !self.is_online() || self.is_syncing() {
            return false;
        }
        if self.unsynced_count().await == 0 {
            return false;
        }
        if register_background_sync(self.registrar.as_deref()) {
            return true;
        }
        matches!(self.sync_all().await, Ok(SyncOutcome::Completed(_)))
    }

    /// Call `sync_pending` on every tick until the task is dropped.
    pub async fn poll_pending(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sync_pending().await;
        }
    }

    /// Apply a connectivity change, without running any sync itself.
    ///
    /// Returns whether the change should be followed by a settle-then-sync.
    fn apply_connectivity(&self, online: bool) -> bool {
        if !self.set_online(online) {
            return false;
        }
        if online {
            tracing::info!("Connection restored");
            self.notify(SyncNotice::WentOnline);
        } else {
            tracing::info!("Connection lost");
            self.notify(SyncNotice::WentOffline);
        }
        online
    }

    /// Record a background pass; returns whether a foreground pass should follow.
    async fn apply_worker_message(&self, message: WorkerMessage) -> bool {
        let WorkerMessage::SyncComplete { count } = message;
        tracing::info!("Background sync completed: {count} transaction(s)");

        let remaining = self.unsynced_count().await;
        self.notify(SyncNotice::BackgroundComplete { count });
        remaining > 0 && self.is_online() && !self.engine.is_running()
    }
}

impl<S: TransactionSubmitter + 'static> SyncCoordinator<S> {
    /// Process signals until the channel closes.
    ///
    /// Sync work is spawned so a connectivity change is never stuck behind a
    /// running batch.
    pub async fn run(self: Arc<Self>, mut signals: mpsc::Receiver<ConnectivitySignal>) {
        self.unsynced_count().await;

        while let Some(signal) = signals.recv().await {
            match signal {
                ConnectivitySignal::Online => {
                    if self.apply_connectivity(true) {
                        let coordinator = Arc::clone(&self);
                        tokio::spawn(async move {
                            coordinator.settle_then_sync().await;
                        });
                    }
                }
                ConnectivitySignal::Offline => {
                    self.apply_connectivity(false);
                }
                ConnectivitySignal::SyncRequested => {
                    let coordinator = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _ = coordinator.sync_all().await;
                    });
                }
                ConnectivitySignal::Worker(message) => {
                    if self.apply_worker_message(message).await {
                        let coordinator = Arc::clone(&self);
                        tokio::spawn(async move {
                            let _ = coordinator.sync_all().await;
                        });
                    }
                }
            }
        }

        tracing::debug!("Sync coordinator stopped");
    }
}
