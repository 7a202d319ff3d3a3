use std::path::Path;

use crate::commands::common::open_queue;
use crate::error::CliError;

pub async fn run_evict(db_path: &Path) -> Result<(), CliError> {
    let removed = open_queue(db_path).evict_synced().await?;
    println!("Evicted {removed} synced transaction(s)");
    Ok(())
}
