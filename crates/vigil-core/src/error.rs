//! Core error types for vigil-core.
//!
//! This module defines the error hierarchy using thiserror. Failures are
//! grouped by the subsystem that produced them: storage, configuration,
//! dispatch. No error here is fatal to a running monitor -- every failure
//! path returns the caller to "awaiting next tick".

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vigil-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Ledger storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Alert/warning dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Ledger storage errors.
///
/// `Unavailable` is the deferral signal: the caller attempts no side
/// effect and retries on the next invocation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the ledger database
    #[error("Failed to open ledger at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Storage cannot be reached right now; defer to the next tick
    #[error("Ledger storage unavailable")]
    Unavailable,

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Ledger migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Ledger is locked")]
    Locked,

    /// IO errors (data directory creation and friends)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value; the previous configuration is kept
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse a configuration value
    #[error("Failed to parse configuration value: {0}")]
    ParseFailed(String),
}

/// Warning/alert dispatch errors. Log-and-continue territory.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No usable destination (blank webhook URL or contact address)
    #[error("Dispatch target not configured: {0}")]
    NotConfigured(String),

    /// The delivery endpoint rejected the payload
    #[error("Dispatch endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Transport-level failure
    #[error("Dispatch transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => match e.code {
                rusqlite::ErrorCode::DatabaseLocked => StorageError::Locked,
                rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::DatabaseCorrupt
                | rusqlite::ErrorCode::SystemIoFailure => StorageError::Unavailable,
                _ => StorageError::QueryFailed(e.to_string()),
            },
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
