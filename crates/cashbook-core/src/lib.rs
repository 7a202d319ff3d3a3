//! cashbook-core - Offline transaction queue for Cashbook
//!
//! Transactions recorded without connectivity are parked in a local `SQLite`
//! store and forwarded to the Cashbook server once the device is back
//! online, either by the foreground coordinator or by a background worker.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod sync;
pub mod util;

pub use config::{ConfigError, QueueConfig};
pub use error::{Error, Result};
pub use models::{QueueRecord, RecordId, SyncState, TransactionDraft, TransactionKind};
pub use queue::{QueueManager, StoreLocation};
