use std::path::PathBuf;

use cashbook_core::TransactionKind;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cashbook")]
#[command(about = "Record cash book transactions offline and sync them later")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the offline queue database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a new transaction
    ///
    /// The record goes straight into the local store; a running `cashbook
    /// watch` sends it on its next poll.
    #[command(alias = "new")]
    Add {
        /// Direction of the cash movement
        #[arg(long = "type", value_enum)]
        kind: KindArg,
        /// Positive amount
        #[arg(long)]
        amount: f64,
        /// Transaction date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "ID")]
        category_id: Option<String>,
        /// Counterparty name
        #[arg(long, value_name = "NAME")]
        party: Option<String>,
    },
    /// List queued transactions
    List {
        /// Include records already marked synced
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how many transactions are waiting
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send queued transactions to the server
    Sync {
        /// Behave as if the device had no connectivity
        #[arg(long)]
        offline: bool,
    },
    /// Delete records already marked synced
    Evict,
    /// Delete every queued record
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Keep syncing in the foreground and background until interrupted
    Watch,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    CashIn,
    CashOut,
}

impl From<KindArg> for TransactionKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::CashIn => Self::CashIn,
            KindArg::CashOut => Self::CashOut,
        }
    }
}
