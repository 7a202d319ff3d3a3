use std::path::Path;

use cashbook_core::sync::{SkipReason, SyncCoordinator, SyncOutcome};
use cashbook_core::QueueConfig;

use crate::commands::common::{format_report, http_submitter, open_queue};
use crate::error::CliError;

pub async fn run_sync(offline: bool, config: &QueueConfig, db_path: &Path) -> Result<(), CliError> {
    let submitter = http_submitter(config)?;
    let coordinator = SyncCoordinator::new(open_queue(db_path), submitter, !offline);

    match coordinator.sync_all().await? {
        SyncOutcome::Completed(report) => println!("{}", format_report(report)),
        SyncOutcome::Skipped(SkipReason::Offline) => println!("Cannot sync while offline"),
        SyncOutcome::Skipped(SkipReason::AlreadyRunning) => println!("Sync already in progress"),
    }
    Ok(())
}
