//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in key store and audit log operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No license with this key.
    #[error("license not found: {0}")]
    NotFound(String),

    /// Issuance conflict: the key has been issued before.
    #[error("license key already exists: {0}")]
    DuplicateKey(String),

    /// Revocation of a license that is already revoked.
    #[error("license already revoked: {0}")]
    AlreadyRevoked(String),

    /// The underlying record store could not serve the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored record could not be decoded.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// The operation did not complete within its deadline.
    #[error("storage operation timed out")]
    Timeout,
}

impl StoreError {
    /// Returns true if the error means storage could not be reached or
    /// trusted, as opposed to a lifecycle conflict.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::Corrupt { .. } | Self::Timeout
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}
