//! Offline queue manager.
//!
//! The intent-level API callers use to park transactions while offline. The
//! manager owns nothing but a lazily opened store handle; construct one per
//! process and share it behind an `Arc`.

use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

use crate::db::{Database, LibSqlQueueRepository, QueueRepository};
use crate::error::{Error, Result};
use crate::models::{NewQueueRecord, QueueRecord, RecordId, SyncState};

/// Where the queue's records live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A database file on disk, shared by every handle opened on the same path
    File(PathBuf),
    /// A private in-memory database (tests)
    InMemory,
}

/// Thread-safe facade over the durable local store.
pub struct QueueManager {
    location: StoreLocation,
    store: OnceCell<Mutex<Database>>,
}

impl QueueManager {
    /// Create a manager for the given location. Nothing is opened until first use.
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            store: OnceCell::new(),
        }
    }

    /// Create a manager backed by a database file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreLocation::File(path.into()))
    }

    /// Create a manager backed by an in-memory database (primarily for tests).
    pub fn in_memory() -> Self {
        Self::new(StoreLocation::InMemory)
    }

    pub const fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Open the store now instead of on first use.
    pub async fn open(&self) -> Result<()> {
        self.store().await.map(|_| ())
    }

    /// Whether the store has been opened successfully.
    pub fn is_open(&self) -> bool {
        self.store.initialized()
    }

    async fn store(&self) -> Result<&Mutex<Database>> {
        // A failed open is not cached; the next call tries again.
        self.store
            .get_or_try_init(|| async {
                let opened = match &self.location {
                    StoreLocation::File(path) => Database::open(path).await,
                    StoreLocation::InMemory => Database::open_in_memory().await,
                };
                match opened {
                    Ok(db) => {
                        tracing::info!("Offline queue opened ({:?})", self.location);
                        Ok(Mutex::new(db))
                    }
                    Err(error) => {
                        tracing::error!("Failed to open offline queue: {error}");
                        Err(Error::StorageUnavailable(error.to_string()))
                    }
                }
            })
            .await
    }

    /// Park a payload as a new unsynced record and return its local id.
    pub async fn enqueue(&self, payload: Value) -> Result<RecordId> {
        let store = self.store().await?;
        let db = store.lock().await;
        let repo = LibSqlQueueRepository::new(db.connection());

        let id = repo
            .insert(&NewQueueRecord::unsynced(payload))
            .await
            .map_err(|error| {
                tracing::error!("Failed to add to queue: {error}");
                Error::EnqueueFailed(error.to_string())
            })?;
        tracing::info!("Added to queue: {id}");
        Ok(id)
    }

    /// Records still waiting for the server, in insertion order.
    pub async fn list_unsynced(&self) -> Result<Vec<QueueRecord>> {
        let store = self.store().await?;
        let db = store.lock().await;
        LibSqlQueueRepository::new(db.connection())
            .get_by_state(SyncState::Unsynced)
            .await
    }

    /// Every record regardless of state.
    pub async fn list_all(&self) -> Result<Vec<QueueRecord>> {
        let store = self.store().await?;
        let db = store.lock().await;
        LibSqlQueueRepository::new(db.connection()).list_all().await
    }

    /// Number of unsynced records. Always re-queries the store.
    pub async fn count_unsynced(&self) -> Result<u64> {
        let store = self.store().await?;
        let db = store.lock().await;
        LibSqlQueueRepository::new(db.connection())
            .count_by_state(SyncState::Unsynced)
            .await
    }

    /// Flag a record as accepted by the server. Unknown ids are ignored.
    pub async fn mark_synced(&self, id: RecordId) -> Result<()> {
        let store = self.store().await?;
        let db = store.lock().await;
        let repo = LibSqlQueueRepository::new(db.connection());

        let Some(mut record) = repo.get(id).await? else {
            return Ok(());
        };
        record.sync_state = SyncState::Synced;
        repo.update(&record).await?;
        tracing::debug!("Marked as synced: {id}");
        Ok(())
    }

    /// Delete a record outright.
    pub async fn remove(&self, id: RecordId) -> Result<()> {
        let store = self.store().await?;
        let db = store.lock().await;
        LibSqlQueueRepository::new(db.connection()).delete(id).await?;
        tracing::debug!("Removed from queue: {id}");
        Ok(())
    }

    /// Delete every record already marked synced.
    pub async fn evict_synced(&self) -> Result<u64> {
        let store = self.store().await?;
        let db = store.lock().await;
        let removed = LibSqlQueueRepository::new(db.connection())
            .delete_by_state(SyncState::Synced)
            .await?;
        tracing::info!("Cleared {removed} synced transaction(s)");
        Ok(removed)
    }

    /// Delete every record. Maintenance only.
    pub async fn clear_all(&self) -> Result<u64> {
        let store = self.store().await?;
        let db = store.lock().await;
        let removed = LibSqlQueueRepository::new(db.connection()).clear().await?;
        tracing::warn!("Cleared all {removed} queued transaction(s)");
        Ok(removed)
    }
}
