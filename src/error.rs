//! Error types for sqlite-json.
//!
//! Every operation in the crate reports failure through [`ExportError`]. The
//! variants follow the four failure classes of an export: a malformed request,
//! a database failure, a value that has no JSON representation, and a failed
//! write of the output.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Error types for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The request names neither a table nor a SQL statement, or names an
    /// invalid table.
    #[error("Invalid export request: {0}")]
    InvalidRequest(String),

    /// Opening the database, preparing or running a query failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A column value cannot be represented in JSON.
    #[error("Cannot serialize column '{column}': {message}")]
    Serialization { column: String, message: String },

    /// JSON encoding of the assembled result failed.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The blocking database task panicked or was aborted.
    #[error("Database task failed: {0}")]
    TaskFailed(String),
}

impl ExportError {
    /// Shorthand for [`ExportError::InvalidRequest`].
    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        ExportError::InvalidRequest(message.into())
    }

    /// Shorthand for [`ExportError::Serialization`].
    pub(crate) fn serialization(column: &str, message: impl Into<String>) -> Self {
        ExportError::Serialization {
            column: column.to_string(),
            message: message.into(),
        }
    }
}
