//! Error types for secret storage backends.

use serde::{Deserialize, Serialize};

/// Result type alias for secret storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during secret storage operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", content = "message")]
pub enum Error {
    /// Secure storage is not available on this platform/device.
    #[error("Secure storage not available: {0}")]
    NotAvailable(String),

    /// Access to secure storage was denied by the OS.
    #[error("Access denied to secure storage")]
    AccessDenied,

    /// The backing file exists but could not be parsed.
    #[error("Secret storage is corrupted: {0}")]
    Corrupted(String),

    /// I/O error while reading or writing the backing store.
    #[error("I/O error: {0}")]
    Io(String),

    /// Platform-specific internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Error::AccessDenied
        } else {
            Error::Io(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Storage task failed: {}", err))
    }
}
