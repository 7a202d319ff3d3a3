//! Getting queued transactions to the server.
//!
//! - [`client`]: the submitter contract and its HTTP implementation
//! - [`engine`]: one drain pass over the queue
//! - [`coordinator`]: foreground state machine driven by connectivity
//! - [`background`]: worker that drains the queue from its own context
//! - [`connectivity`]: reachability probing

pub mod background;
pub mod client;
pub mod connectivity;
pub mod coordinator;
pub mod engine;

#[cfg(test)]
pub(crate) mod testing;

pub use background::{
    register_background_sync, BackgroundRegistrar, BackgroundSyncHandle, BackgroundSyncWorker,
    RegistrationError, WorkerMessage, SYNC_TAG,
};
pub use client::{
    HttpTransactionSubmitter, SubmissionError, SubmissionResult, TransactionSubmitter,
    CREATE_TRANSACTION_PATH,
};
pub use connectivity::{ConnectivityMonitor, ConnectivityProbe, HttpProbe};
pub use coordinator::{
    ConnectivitySignal, ConnectivityState, QueueStatus, SyncCoordinator, SyncNotice,
    DEFAULT_SETTLE_DELAY,
};
pub use engine::{SkipReason, SyncEngine, SyncOutcome, SyncReport};
