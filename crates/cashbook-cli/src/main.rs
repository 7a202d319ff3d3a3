//! Cash Book CLI - record transactions offline and sync them later

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use cashbook_core::QueueConfig;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add, AddArgs};
use crate::commands::clear::run_clear;
use crate::commands::common::resolve_db_path;
use crate::commands::evict::run_evict;
use crate::commands::list::run_list;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = QueueConfig::from_env()?;
    let db_path = resolve_db_path(cli.db_path, &config)?;

    match cli.command {
        Commands::Add {
            kind,
            amount,
            date,
            description,
            category_id,
            party,
        } => {
            let args = AddArgs {
                kind: kind.into(),
                amount,
                date,
                description,
                category_id,
                party,
            };
            run_add(args, &db_path).await?;
        }
        Commands::List { all, json } => run_list(all, json, &db_path).await?,
        Commands::Status { json } => run_status(json, &db_path).await?,
        Commands::Sync { offline } => run_sync(offline, &config, &db_path).await?,
        Commands::Evict => run_evict(&db_path).await?,
        Commands::Clear { yes } => run_clear(yes, &db_path).await?,
        Commands::Watch => run_watch(&config, &db_path).await?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "cashbook=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
