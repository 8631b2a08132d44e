//! Storage layer error types
//!
//! All errors that can occur during collection operations are defined here.
//! Callers mostly care about [`ErrorKind`], which separates the expected
//! outcomes (missing collection, missing id, ...) from fatal I/O failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::{CollectionName, InvalidNameError, SchemaError};

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// create targeted a collection whose file already exists
    #[error("collection '{0}' already exists")]
    AlreadyExists(CollectionName),

    /// the collection has no backing file
    #[error("collection '{0}' not found")]
    NotFound(CollectionName),

    /// no record in the collection carries the requested id
    #[error("id '{id}' not found in collection '{collection}'")]
    NotFoundId { collection: CollectionName, id: String },

    /// the requested name sanitizes to nothing
    #[error("invalid collection name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// the requested field list is unusable
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// the file exists but its content cannot be a collection
    #[error("corrupted collection at {path}: {reason}")]
    CorruptedData { path: PathBuf, reason: String },

    /// CSV encoding or decoding failed
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (filesystem level, including lock failures)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller-visible classification of a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    NotFoundId,
    InvalidName,
    InvalidSchema,
    /// unexpected I/O, parsing or encoding failure
    Fatal,
}

impl ErrorKind {
    /// stable snake_case label used in structured results
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotFoundId => "not_found_id",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::InvalidSchema => "invalid_schema",
            ErrorKind::Fatal => "fatal",
        }
    }
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::NotFoundId { .. } => ErrorKind::NotFoundId,
            StorageError::InvalidName(_) => ErrorKind::InvalidName,
            StorageError::InvalidSchema(_) => ErrorKind::InvalidSchema,
            StorageError::CorruptedData { .. }
            | StorageError::Csv(_)
            | StorageError::Serialization(_)
            | StorageError::Io(_) => ErrorKind::Fatal,
        }
    }

    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_) | StorageError::NotFoundId { .. }
        )
    }

    /// check if this error is an unexpected failure rather than a normal outcome
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let name = CollectionName::new("notes").unwrap();

        let missing = StorageError::NotFound(name.clone());
        assert!(missing.is_not_found());
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(!missing.is_fatal());

        let missing_id = StorageError::NotFoundId {
            collection: name.clone(),
            id: "42".into(),
        };
        assert!(missing_id.is_not_found());
        assert_eq!(missing_id.kind().as_str(), "not_found_id");

        let exists = StorageError::AlreadyExists(name);
        assert!(!exists.is_not_found());
        assert_eq!(exists.kind(), ErrorKind::AlreadyExists);

        let io = StorageError::Io(std::io::Error::other("disk on fire"));
        assert!(io.is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let name = CollectionName::new("ghost").unwrap();
        assert_eq!(
            StorageError::NotFound(name).to_string(),
            "collection 'ghost' not found"
        );
        assert_eq!(
            StorageError::InvalidSchema(SchemaError::NoFields).to_string(),
            "invalid schema: a collection needs at least one field"
        );
    }
}
