use crate::domain::{errors::StorageError, value_objects::ObjectKey};

/// Convert an object_store error into a domain storage error for `key`
pub(crate) fn map_store_error(
    err: object_store::Error,
    key: &ObjectKey,
    operation: &str,
) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::ObjectNotFound { key: key.clone() },
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => StorageError::AccessDenied {
            key: key.clone(),
            operation: operation.to_string(),
        },
        object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented { .. } => {
            StorageError::UnsupportedOperation {
                operation: operation.to_string(),
                reason: err.to_string(),
            }
        }
        _ => StorageError::StorageBackendError {
            operation: operation.to_string(),
            message: err.to_string(),
        },
    }
}

/// Convert an HTTP status returned by the store into a domain storage error
pub(crate) fn map_status_error(
    status: http::StatusCode,
    body: &str,
    key: &ObjectKey,
    operation: &str,
) -> StorageError {
    match status {
        http::StatusCode::NOT_FOUND if body.contains("NoSuchKey") => {
            StorageError::ObjectNotFound { key: key.clone() }
        }
        http::StatusCode::FORBIDDEN | http::StatusCode::UNAUTHORIZED => {
            StorageError::AccessDenied {
                key: key.clone(),
                operation: operation.to_string(),
            }
        }
        _ => StorageError::StorageBackendError {
            operation: operation.to_string(),
            message: format!("HTTP {}: {}", status, body.trim()),
        },
    }
}
