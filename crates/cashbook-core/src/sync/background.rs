//! Background sync: a worker with its own store handle that drains the
//! queue when a sync tag is registered, then reports back to foreground
//! clients.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::client::TransactionSubmitter;
use super::coordinator::ConnectivitySignal;
use super::engine::{SyncEngine, SyncOutcome};
use crate::queue::QueueManager;

/// Tag registered whenever a transaction is queued
pub const SYNC_TAG: &str = "sync-transactions";

const REGISTRATION_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Background sync is not supported")]
    Unsupported,
    #[error("Background sync registration rejected: {0}")]
    Rejected(String),
}

/// Something that can schedule a background sync for a tag.
///
/// Registration is fire-and-forget; registering a tag that is already
/// pending coalesces into a single sync.
pub trait BackgroundRegistrar: Send + Sync {
    fn register(&self, tag: &str) -> Result<(), RegistrationError>;
}

/// Ask for a background sync of the offline queue.
///
/// Failures are logged and swallowed; they never affect the enqueue that
/// triggered them. Returns whether the registration was accepted.
pub fn register_background_sync(registrar: Option<&dyn BackgroundRegistrar>) -> bool {
    let Some(registrar) = registrar else {
        tracing::debug!("Background sync not available");
        return false;
    };

    match registrar.register(SYNC_TAG) {
        Ok(()) => {
            tracing::info!("Background sync registered");
            true
        }
        Err(error) => {
            tracing::warn!("Background sync registration failed: {error}");
            false
        }
    }
}

/// Message the worker posts to every foreground client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// A background pass finished; `count` records reached the server
    SyncComplete { count: usize },
}

/// Registrar side of a running `BackgroundSyncWorker`
#[derive(Debug, Clone)]
pub struct BackgroundSyncHandle {
    tags: mpsc::Sender<String>,
}

impl BackgroundRegistrar for BackgroundSyncHandle {
    fn register(&self, tag: &str) -> Result<(), RegistrationError> {
        self.tags.try_send(tag.to_string()).map_err(|error| match error {
            mpsc::error::TrySendError::Closed(_) => RegistrationError::Unsupported,
            mpsc::error::TrySendError::Full(_) => {
                RegistrationError::Rejected("too many pending registrations".to_string())
            }
        })
    }
}

/// Drains the queue on registration, independent of any foreground client.
///
/// Give it a `QueueManager` of its own opened on the same file as the
/// foreground; the two contexts share nothing but the database.
pub struct BackgroundSyncWorker<S> {
    engine: SyncEngine<S>,
    tags: mpsc::Receiver<String>,
    clients: mpsc::Sender<ConnectivitySignal>,
}

impl<S: TransactionSubmitter + 'static> BackgroundSyncWorker<S> {
    /// Start the worker task.
    ///
    /// The task stops once every handle is dropped.
    pub fn spawn(
        queue: Arc<QueueManager>,
        submitter: S,
        clients: mpsc::Sender<ConnectivitySignal>,
    ) -> (BackgroundSyncHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(REGISTRATION_BUFFER);
        let worker = Self {
            engine: SyncEngine::new(queue, submitter),
            tags: rx,
            clients,
        };
        (BackgroundSyncHandle { tags: tx }, tokio::spawn(worker.run()))
    }

    async fn run(mut self) {
        tracing::debug!("Background sync worker started");

        while let Some(tag) = self.tags.recv().await {
            let mut pending = BTreeSet::from([tag]);
            while let Ok(more) = self.tags.try_recv() {
                pending.insert(more);
            }

            for tag in pending {
                if tag == SYNC_TAG {
                    self.sync_transactions().await;
                } else {
                    tracing::debug!("Ignoring unknown sync tag: {tag}");
                }
            }
        }

        tracing::debug!("Background sync worker stopped");
    }

    async fn sync_transactions(&self) {
        let report = match self.engine.run().await {
            Ok(SyncOutcome::Completed(report)) => report,
            Ok(SyncOutcome::Skipped(reason)) => {
                tracing::debug!("Background sync skipped: {reason:?}");
                return;
            }
            Err(error) => {
                tracing::error!("Background sync failed: {error}");
                return;
            }
        };

        let message = WorkerMessage::SyncComplete {
            count: report.success,
        };
        if self
            .clients
            .send(ConnectivitySignal::Worker(message))
            .await
            .is_err()
        {
            tracing::debug!("No clients listening for background sync results");
        }
    }
}
