use std::path::Path;

use serde::Serialize;

use crate::commands::common::open_queue;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub db_path: String,
    pub unsynced_count: u64,
    pub total_count: usize,
}

pub fn format_status(report: &StatusReport) -> String {
    match report.unsynced_count {
        0 => "All transactions synced".to_string(),
        1 => "1 transaction waiting to sync".to_string(),
        count => format!("{count} transactions waiting to sync"),
    }
}

pub async fn run_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let queue = open_queue(db_path);
    let report = StatusReport {
        db_path: db_path.display().to_string(),
        unsynced_count: queue.count_unsynced().await?,
        total_count: queue.list_all().await?.len(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_status(&report));
    }
    Ok(())
}
