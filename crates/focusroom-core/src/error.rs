//! Core error types for focusroom-core.
//!
//! Failures fall into three groups: validation errors (rejected synchronously,
//! no state change), store errors (reported, never rolled back) and the
//! unauthenticated condition raised by ledger operations without an identity.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No signed-in identity is available.
    #[error("Not authenticated: set account.user_id to sign in")]
    Unauthenticated,

    /// Document missing or owned by another user
    #[error("{collection} '{id}' not found")]
    NotFound { collection: String, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors. Raising one never mutates state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Timer is running: stop the timer before changing presets")]
    TimerRunning,

    #[error("Invalid value for '{field}': {value} is outside {min}..={max}")]
    OutOfRange {
        field: String,
        min: u32,
        max: u32,
        value: u32,
    },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Built-in preset '{0}' cannot be modified")]
    BuiltinPreset(String),

    #[error("Preset id '{0}' already exists")]
    DuplicatePreset(String),

    #[error("'{0}' must not be empty")]
    EmptyField(String),

    #[error("Unknown timer mode: {0}")]
    InvalidMode(String),

    #[error("Unknown stats range '{0}' (expected week, month or all)")]
    UnknownRange(String),

    #[error("Invalid {field}: '{value}'")]
    InvalidValue { field: String, value: String },
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A document could not be encoded or decoded
    #[error("Document encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Backend refused the write (used by tests and read-only stores)
    #[error("Store is unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
