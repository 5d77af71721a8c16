use std::io;

use thiserror::Error;

/// Failures of user-triggered ledger actions. The display text is the
/// message surfaced to whoever requested the action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds for {purpose}: balance {available:.4} AENZ, required {required:.4} AENZ")]
    InsufficientFunds {
        purpose: &'static str,
        available: f64,
        required: f64,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

// Custom error type for the application
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Logger error: {0}")]
    Logger(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, SimulationError>;
