use std::path::Path;

use crate::commands::common::open_queue;
use crate::error::CliError;

pub async fn run_clear(confirmed: bool, db_path: &Path) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::ConfirmationRequired);
    }

    let removed = open_queue(db_path).clear_all().await?;
    println!("Cleared {removed} queued transaction(s)");
    Ok(())
}
