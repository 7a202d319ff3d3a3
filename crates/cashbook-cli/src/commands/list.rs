use std::path::Path;

use crate::commands::common::{
    format_record_lines, now_millis, open_queue, record_to_list_item, QueueListItem,
};
use crate::error::CliError;

pub async fn run_list(include_synced: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let queue = open_queue(db_path);
    let records = if include_synced {
        queue.list_all().await?
    } else {
        queue.list_unsynced().await?
    };
    let now = now_millis();

    if as_json {
        let json_items = records
            .iter()
            .map(|record| record_to_list_item(record, now))
            .collect::<Vec<QueueListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No queued transactions.");
        return Ok(());
    }

    for line in format_record_lines(&records, now) {
        println!("{line}");
    }
    Ok(())
}
