use std::path::Path;

use cashbook_core::{TransactionDraft, TransactionKind};
use serde_json::Value;

use crate::commands::common::open_queue;
use crate::error::CliError;

pub struct AddArgs {
    pub kind: TransactionKind,
    pub amount: f64,
    pub date: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub party: Option<String>,
}

pub fn build_payload(args: AddArgs) -> Result<Value, CliError> {
    let draft = TransactionDraft::new(args.kind, args.amount)
        .with_date(args.date)
        .with_description(args.description)
        .with_category(args.category_id)
        .with_party(args.party)
        .validate()?;
    Ok(draft.to_payload()?)
}

pub async fn run_add(args: AddArgs, db_path: &Path) -> Result<(), CliError> {
    let payload = build_payload(args)?;

    let queue = open_queue(db_path);
    let id = queue.enqueue(payload).await?;

    println!("{id}");
    Ok(())
}
