use crate::domain::{errors::ValidationError, value_objects::ObjectKey};

/// Errors that can occur during object storage operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// Object not found
    #[error("Object not found: {key}")]
    ObjectNotFound { key: ObjectKey },

    /// The store refused the credentials or the operation on this key
    #[error("Access denied for operation '{operation}' on object: {key}")]
    AccessDenied { key: ObjectKey, operation: String },

    /// Declared content length differs from the body handed to the store
    #[error("Content length mismatch for object '{key}': declared {declared} bytes, body has {actual}")]
    ContentLengthMismatch {
        key: ObjectKey,
        declared: u64,
        actual: u64,
    },

    /// URL signing requested without static credentials
    #[error("Cannot sign request: {reason}")]
    SigningUnavailable { reason: String },

    /// Validation error
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Unsupported operation
    #[error("Unsupported operation '{operation}': {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    /// Storage backend error
    #[error("Storage backend error during {operation}: {message}")]
    StorageBackendError { operation: String, message: String },
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
