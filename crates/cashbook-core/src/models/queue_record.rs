//! Queue record model

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local identifier assigned by the store (auto-increment, never reused)
pub type RecordId = i64;

/// Whether a queued record has reached the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Waiting for a successful submission
    #[default]
    Unsynced,
    /// Confirmed by the server, kept until evicted
    Synced,
}

impl SyncState {
    /// Column value stored in `offline_queue.synced`
    pub const fn as_db(self) -> i64 {
        match self {
            Self::Unsynced => 0,
            Self::Synced => 1,
        }
    }

    /// Parse a stored column value. Any non-zero value counts as synced.
    pub const fn from_db(value: i64) -> Self {
        if value == 0 {
            Self::Unsynced
        } else {
            Self::Synced
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsynced => write!(f, "unsynced"),
            Self::Synced => write!(f, "synced"),
        }
    }
}

/// A locally persisted operation waiting for (or past) server submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Opaque payload forwarded to the server as-is
    pub payload: Value,
    /// Insertion timestamp (Unix ms)
    pub enqueued_at: i64,
    /// Sync state
    pub sync_state: SyncState,
}

/// A record that has not been written yet and therefore has no id
#[derive(Debug, Clone, PartialEq)]
pub struct NewQueueRecord {
    pub payload: Value,
    pub enqueued_at: i64,
    pub sync_state: SyncState,
}

impl NewQueueRecord {
    /// Build an unsynced record stamped with the current time
    #[must_use]
    pub fn unsynced(payload: Value) -> Self {
        Self {
            payload,
            enqueued_at: crate::util::unix_millis_now(),
            sync_state: SyncState::Unsynced,
        }
    }

    /// Attach the id the store assigned
    #[must_use]
    pub fn with_id(self, id: RecordId) -> QueueRecord {
        QueueRecord {
            id,
            payload: self.payload,
            enqueued_at: self.enqueued_at,
            sync_state: self.sync_state,
        }
    }
}
