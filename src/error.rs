//! Error types for the Seedbed journaling core
//!
//! One structured error enum built on thiserror; every fallible operation in
//! the crate returns the [`Result`] alias defined here.

use thiserror::Error;

/// Main error type for Seedbed operations
#[derive(Error, Debug)]
pub enum JournalError {
    /// Storage engine failure (I/O, statement, connection). The operation is
    /// treated as not having happened: no partial write is visible.
    #[error("storage error: {0}")]
    Storage(String),

    /// A required field was empty or a supplied value was out of range;
    /// rejected before any write.
    #[error("validation error: {0}")]
    Validation(String),

    /// A read referenced a record that does not exist. Mutating operations
    /// on missing ids are lenient no-ops and do not raise this.
    #[error("not found: {0}")]
    NotFound(String),

    /// A composite multi-record operation failed after some sub-writes had
    /// already committed. Nothing is rolled back; the startup reconciliation
    /// pass repairs the store lazily.
    #[error("partial write: {0}")]
    PartialConsistency(String),

    /// Malformed JSON in a snapshot or a legacy blob
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error outside the database itself
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for Seedbed operations
pub type Result<T> = std::result::Result<T, JournalError>;

impl From<libsql::Error> for JournalError {
    fn from(err: libsql::Error) -> Self {
        JournalError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JournalError::NotFound("seed-abc".to_string());
        assert_eq!(err.to_string(), "not found: seed-abc");

        let err = JournalError::Validation("branch name is empty".to_string());
        assert_eq!(err.to_string(), "validation error: branch name is empty");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: JournalError = parse_err.into();
        assert!(matches!(err, JournalError::Serialization(_)));
    }
}
