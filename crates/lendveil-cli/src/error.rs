//! CLI error types

use lendveil_engine::{LendingError, RevealError};
use lendveil_ledger::LedgerError;
use lendveil_types::ScalarWidthError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Lifecycle error
    #[error("{0}")]
    Lending(#[from] LendingError),

    /// Reveal refused
    #[error("Reveal refused: {0}")]
    Reveal(#[from] RevealError),

    /// Ledger or history replay error
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Commitment does not fit the ledger scalar
    #[error("Invalid commitment: {0}")]
    Commitment(#[from] ScalarWidthError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
