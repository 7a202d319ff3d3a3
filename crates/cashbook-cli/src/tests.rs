use std::path::PathBuf;

use cashbook_core::sync::{SyncNotice, SyncReport};
use cashbook_core::{QueueConfig, QueueRecord, SyncState, TransactionKind};
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::cli::{Cli, Commands, KindArg};
use crate::commands::add::{build_payload, AddArgs};
use crate::commands::common::{
    describe_payload, format_notice, format_record_lines, format_relative_time, format_report,
    format_timestamp, record_to_list_item, resolve_db_path,
};
use crate::commands::status::{format_status, StatusReport};
use crate::error::CliError;

fn add_args(amount: f64) -> AddArgs {
    AddArgs {
        kind: TransactionKind::CashOut,
        amount,
        date: Some("2024-05-01".to_string()),
        description: Some("  Flour  ".to_string()),
        category_id: None,
        party: Some("Bakery".to_string()),
    }
}

fn record(id: i64, payload: serde_json::Value, sync_state: SyncState) -> QueueRecord {
    QueueRecord {
        id,
        payload,
        enqueued_at: 1_000,
        sync_state,
    }
}

#[test]
fn parses_add_command() {
    let cli = Cli::try_parse_from([
        "cashbook",
        "add",
        "--type",
        "cash-in",
        "--amount",
        "12.5",
        "--party",
        "Alice",
    ])
    .unwrap();

    match cli.command {
        Commands::Add {
            kind,
            amount,
            party,
            date,
            ..
        } => {
            assert_eq!(kind, KindArg::CashIn);
            assert_eq!(TransactionKind::from(kind), TransactionKind::CashIn);
            assert!((amount - 12.5).abs() < f64::EPSILON);
            assert_eq!(party.as_deref(), Some("Alice"));
            assert_eq!(date, None);
        }
        _ => panic!("expected add command"),
    }
}

#[test]
fn db_path_flag_is_global() {
    let cli = Cli::try_parse_from(["cashbook", "status", "--db-path", "/tmp/q.db"]).unwrap();
    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/q.db")));
    assert!(matches!(cli.command, Commands::Status { json: false }));
}

#[test]
fn resolve_db_path_prefers_cli_then_config() {
    let config = QueueConfig {
        db_path: Some(PathBuf::from("/from/env.db")),
        ..QueueConfig::default()
    };

    assert_eq!(
        resolve_db_path(Some(PathBuf::from("/from/cli.db")), &config).unwrap(),
        PathBuf::from("/from/cli.db")
    );
    assert_eq!(
        resolve_db_path(None, &config).unwrap(),
        PathBuf::from("/from/env.db")
    );
}

#[test]
fn build_payload_normalizes_draft() {
    let payload = build_payload(add_args(7.0)).unwrap();
    assert_eq!(
        payload,
        json!({
            "type": "cash_out",
            "amount": 7.0,
            "transaction_date": "2024-05-01",
            "description": "Flour",
            "party_name": "Bakery",
        })
    );
}

#[test]
fn build_payload_rejects_non_positive_amount() {
    let err = build_payload(add_args(0.0)).unwrap_err();
    assert!(matches!(err, CliError::Core(_)));
    assert!(err.to_string().contains("positive"));
}

#[test]
fn describe_payload_summarizes_known_fields() {
    let payload = json!({
        "type": "cash_in",
        "amount": 25,
        "party_name": "Alice",
        "description": "Invoice   #12 settled in full with a long trailing note",
    });
    assert_eq!(
        describe_payload(&payload),
        "cash_in  25  Alice  Invoice #12 settled in full with a lo..."
    );
    assert_eq!(describe_payload(&json!({"foo": 1})), r#"{"foo":1}"#);
}

#[test]
fn format_record_lines_marks_state() {
    let records = vec![
        record(1, json!({"type": "cash_in", "amount": 5}), SyncState::Unsynced),
        record(2, json!({"type": "cash_out", "amount": 3}), SyncState::Synced),
    ];
    let lines = format_record_lines(&records, 1_000 + 120_000);
    assert_eq!(
        lines,
        vec![
            "#1     pending  cash_in  5  (2m ago)".to_string(),
            "#2     synced   cash_out  3  (2m ago)".to_string(),
        ]
    );
}

#[test]
fn list_item_includes_iso_timestamp() {
    let item = record_to_list_item(
        &record(3, json!({"amount": 1}), SyncState::Synced),
        1_000,
    );
    assert!(item.synced);
    assert_eq!(item.enqueued_at_iso, format_timestamp(1_000));
    assert!(item.enqueued_at_iso.starts_with("1970-01-01T00:00:01"));
    assert_eq!(item.relative_time, "just now");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
    assert_eq!(format_relative_time(now - 14 * 24 * 60 * 60_000, now), "2w ago");
}

#[test]
fn format_report_variants() {
    assert_eq!(format_report(SyncReport::default()), "Nothing to sync");
    assert_eq!(
        format_report(SyncReport { success: 3, failed: 0 }),
        "Synced 3 transaction(s)"
    );
    assert_eq!(
        format_report(SyncReport { success: 2, failed: 1 }),
        "Synced 2 transaction(s), 1 failed and will be retried"
    );
}

#[test]
fn format_notice_hides_empty_background_runs() {
    assert_eq!(
        format_notice(&SyncNotice::BackgroundComplete { count: 0 }),
        None
    );
    assert_eq!(
        format_notice(&SyncNotice::BackgroundComplete { count: 2 }).as_deref(),
        Some("Synced 2 offline transaction(s) in the background")
    );
    assert_eq!(
        format_notice(&SyncNotice::OfflineSyncRejected).as_deref(),
        Some("Cannot sync while offline")
    );
}

#[test]
fn format_status_pluralizes() {
    let mut report = StatusReport {
        db_path: "/tmp/q.db".to_string(),
        unsynced_count: 0,
        total_count: 0,
    };
    assert_eq!(format_status(&report), "All transactions synced");
    report.unsynced_count = 1;
    assert_eq!(format_status(&report), "1 transaction waiting to sync");
    report.unsynced_count = 4;
    assert_eq!(format_status(&report), "4 transactions waiting to sync");
}
