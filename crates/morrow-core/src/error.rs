//! Core error types for morrow-core.
//!
//! This module defines the error hierarchy using thiserror. Engine rule
//! violations get their own enum so callers can match on them without
//! wading through storage noise.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the engine's rule layer.
///
/// Every mutating operation returns these as typed results; nothing is
/// thrown across the UI boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A state transition was attempted on something not in the required
    /// state (e.g. completing an action that is not `current`, or
    /// answering a question that is not pending). Programmer error:
    /// callers must check state before transitioning.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A mutating transition was attempted on a locked protocol day.
    /// Expected and user-facing: the caller must route to the paywall.
    #[error("Entitlement required for protocol days beyond day 1")]
    EntitlementRequired,

    /// Catalog lookup failed for content that should exist. Indicates a
    /// content/deployment defect; the engine never fabricates a default
    /// plan in its place.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A check-in submission was attempted before every required branch
    /// question for the trigger was answered.
    #[error("Classification incomplete: still waiting on {0}")]
    ClassificationIncomplete(String),
}

/// Core error type for morrow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Engine rule violations
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => {
                DatabaseError::NotFound("query returned no rows".to_string())
            }
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
