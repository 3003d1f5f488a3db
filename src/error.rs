//! Error handling for BikeMi analysis operations.
//!
//! Provides error types with context for station reconciliation, flow
//! retrieval, feature generation and time-series diagnostics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BikeMiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid join key: expected one shared column or a pair of columns, got {got} names")]
    InvalidJoinKey { got: usize },

    #[error("Invalid SQL identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Column '{column}' not found")]
    MissingColumn { column: String },

    #[error("Insufficient data for {operation}: need at least {required} observations, got {actual}")]
    InsufficientData {
        operation: String,
        required: usize,
        actual: usize,
    },

    #[error("Non-finite value at position {position} in {operation} input")]
    NonFiniteValue { operation: String, position: usize },

    #[error("Non-positive value at position {position} in {operation} input")]
    NonPositiveValue { operation: String, position: usize },

    #[error("Degenerate series in {operation}: {reason}")]
    DegenerateSeries { operation: String, reason: String },

    #[error("Invalid window size {window} for a series of length {len}")]
    InvalidWindow { window: usize, len: usize },

    #[error("Unknown {kind} '{name}'")]
    UnknownName { kind: String, name: String },

    #[error("Regression failed in {operation}: {reason}")]
    Regression { operation: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl BikeMiError {
    pub fn unknown(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownName {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn insufficient(operation: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            operation: operation.into(),
            required,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, BikeMiError>;
