use std::path::{Path, PathBuf};
use std::sync::Arc;

use cashbook_core::sync::{HttpTransactionSubmitter, SyncNotice, SyncReport};
use cashbook_core::{QueueConfig, QueueManager, QueueRecord, SyncState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

const DESCRIPTION_PREVIEW_CHARS: usize = 40;

#[derive(Debug, Serialize)]
pub struct QueueListItem {
    pub id: i64,
    pub enqueued_at: i64,
    pub enqueued_at_iso: String,
    pub relative_time: String,
    pub synced: bool,
    pub payload: Value,
}

pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &QueueConfig,
) -> Result<PathBuf, CliError> {
    cli_db_path
        .or_else(|| config.db_path.clone())
        .map_or_else(default_db_path, Ok)
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("cashbook").join("offline-queue.db"))
        .ok_or(CliError::NoDataDir)
}

pub fn open_queue(db_path: &Path) -> Arc<QueueManager> {
    Arc::new(QueueManager::at_path(db_path))
}

pub fn http_submitter(config: &QueueConfig) -> Result<HttpTransactionSubmitter, CliError> {
    let base_url = config.require_api_base_url()?;
    Ok(HttpTransactionSubmitter::new(
        base_url,
        config.api_token.clone(),
        config.request_timeout,
    )?)
}

pub fn record_to_list_item(record: &QueueRecord, now_ms: i64) -> QueueListItem {
    QueueListItem {
        id: record.id,
        enqueued_at: record.enqueued_at,
        enqueued_at_iso: format_timestamp(record.enqueued_at),
        relative_time: format_relative_time(record.enqueued_at, now_ms),
        synced: record.sync_state == SyncState::Synced,
        payload: record.payload.clone(),
    }
}

pub fn format_record_lines(records: &[QueueRecord], now_ms: i64) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let marker = match record.sync_state {
                SyncState::Unsynced => "pending",
                SyncState::Synced => "synced",
            };
            format!(
                "#{:<5} {:<8} {}  ({})",
                record.id,
                marker,
                describe_payload(&record.payload),
                format_relative_time(record.enqueued_at, now_ms)
            )
        })
        .collect()
}

/// One-line summary of a queued transaction payload.
///
/// Payloads are opaque to the queue, so anything missing is simply skipped.
pub fn describe_payload(payload: &Value) -> String {
    let mut parts = Vec::new();

    if let Some(kind) = payload.get("type").and_then(Value::as_str) {
        parts.push(kind.to_string());
    }
    match payload.get("amount") {
        Some(Value::Number(amount)) => parts.push(amount.to_string()),
        Some(Value::String(amount)) => parts.push(amount.clone()),
        _ => {}
    }
    for field in ["transaction_date", "party_name"] {
        if let Some(value) = payload.get(field).and_then(Value::as_str) {
            parts.push(value.to_string());
        }
    }
    if let Some(description) = payload.get("description").and_then(Value::as_str) {
        parts.push(preview(description, DESCRIPTION_PREVIEW_CHARS));
    }

    if parts.is_empty() {
        payload.to_string()
    } else {
        parts.join("  ")
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_report(report: SyncReport) -> String {
    match (report.success, report.failed) {
        (0, 0) => "Nothing to sync".to_string(),
        (success, 0) => format!("Synced {success} transaction(s)"),
        (success, failed) => {
            format!("Synced {success} transaction(s), {failed} failed and will be retried")
        }
    }
}

/// Text shown for a coordinator notice; `None` for notices not worth printing.
pub fn format_notice(notice: &SyncNotice) -> Option<String> {
    match notice {
        SyncNotice::WentOnline => Some("Back online".to_string()),
        SyncNotice::WentOffline => {
            Some("You're offline. Changes will sync when you're back online.".to_string())
        }
        SyncNotice::SavedOffline { id } => Some(format!("Saved offline as #{id}")),
        SyncNotice::SaveFailed { reason } => Some(format!("Failed to save offline: {reason}")),
        SyncNotice::OfflineSyncRejected => Some("Cannot sync while offline".to_string()),
        SyncNotice::BatchComplete { count, failed } => Some(format_report(SyncReport {
            success: *count,
            failed: *failed,
        })),
        SyncNotice::BackgroundComplete { count: 0 } => None,
        SyncNotice::BackgroundComplete { count } => {
            Some(format!("Synced {count} offline transaction(s) in the background"))
        }
        SyncNotice::SyncFailed { reason } => Some(format!("Sync failed: {reason}")),
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map_or_else(|| timestamp_ms.to_string(), |dt| dt.to_rfc3339())
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
