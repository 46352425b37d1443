//! Unified error hierarchy for treadlog
//!
//! The analytics modules never fail; errors only come from the edges
//! (storage, configuration, user input) and are collected here.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all treadlog operations
#[derive(Debug, Error)]
pub enum TreadlogError {
    /// Run storage errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Invalid user input
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Run repository errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not create the database directory
    #[error("Cannot open database at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// Record not found
    #[error("Run not found: {id}")]
    NotFound { id: i64 },

    /// Stored row could not be decoded
    #[error("Invalid row for run {id}: {reason}")]
    InvalidRow { id: i64, reason: String },

    /// Run rejected before storage
    #[error("Invalid run: {0}")]
    Validation(String),
}

impl TreadlogError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TreadlogError::Database(DatabaseError::NotFound { .. }) => ErrorSeverity::Warning,
            TreadlogError::Database(DatabaseError::Validation(_)) => ErrorSeverity::Warning,
            TreadlogError::Validation(_) => ErrorSeverity::Warning,
            TreadlogError::Database(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TreadlogError::Database(DatabaseError::NotFound { id }) => {
                format!("No run with id {} exists.", id)
            }
            TreadlogError::Database(DatabaseError::Open { path, .. }) => {
                format!(
                    "Unable to open the run database at {}. Please check your configuration.",
                    path.display()
                )
            }
            TreadlogError::Database(DatabaseError::Validation(reason))
            | TreadlogError::Validation(reason) => {
                format!("That run can't be saved: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
