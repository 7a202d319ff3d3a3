use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] cashbook_core::Error),
    #[error(transparent)]
    Config(#[from] cashbook_core::ConfigError),
    #[error(transparent)]
    Submission(#[from] cashbook_core::sync::SubmissionError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Could not resolve a data directory; pass --db-path or set CASHBOOK_DB_PATH")]
    NoDataDir,
    #[error("Refusing to clear the offline queue without --yes")]
    ConfirmationRequired,
}
