//! Core error types for the records sync job.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, sqlx, etc.) are converted to these types by the crate
//! that owns the connection.

use thiserror::Error;

use crate::ledger::SyncStatus;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync job.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Remote source error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for local storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised by the sync workflow itself (run-level, never row-level).
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync entry {0} not found")]
    NotFound(i64),

    #[error("Table '{0}' has no transformation rules; configure a primary_key to sync it generically")]
    UnsupportedTable(String),

    #[error("A sync for table '{0}' is already pending or processing")]
    AlreadyActive(String),

    #[error("Sync entry {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: SyncStatus,
        to: SyncStatus,
    },

    #[error(
        "The last run for table '{table}' (entry {entry_id}) failed; \
         set on_failed_window to 'retry' or 'skip_forward' to continue"
    )]
    DecisionRequired { table: String, entry_id: i64 },
}

/// Errors from the remote (read-only) data source. All of them are fatal for
/// the run that hit them.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to connect to remote database: {0}")]
    ConnectionFailed(String),

    #[error("Remote query failed: {0}")]
    QueryFailed(String),

    #[error("Remote query timed out after {0} seconds")]
    Timeout(u64),

    #[error("Remote row could not be decoded: {0}")]
    Decode(String),
}

/// Validation errors for user input and configuration.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("range_limit must be between 1 and {max}, got {value}")]
    RangeLimitOutOfBounds { value: i64, max: i64 },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
