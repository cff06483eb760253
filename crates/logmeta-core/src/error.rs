//! # Query Errors
//!
//! Every failure originates in the storage collaborator and reaches the
//! caller unchanged. An empty result is never an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter operand cannot be compared against its column, e.g. a
    /// `from_date` that is not a calendar date.
    #[error("invalid argument for {column}: '{value}' ({reason})")]
    InvalidArgument {
        column: &'static str,
        value: String,
        reason: String,
    },

    /// The read collaborator could not be opened for this call.
    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    /// A read failed after the connection was established.
    #[error("storage read failed: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl QueryError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
