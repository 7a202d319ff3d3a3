//! Data models for Cash Book

mod queue_record;
mod transaction;

pub use queue_record::{NewQueueRecord, QueueRecord, RecordId, SyncState};
pub use transaction::{TransactionDraft, TransactionKind};
