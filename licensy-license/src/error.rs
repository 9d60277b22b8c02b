//! Error types for the licensing module.

use licensy_storage::StoreError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key rejected at issuance (empty, too long, control characters).
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Owner identifier rejected at issuance.
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    /// Every generated key collided with an existing one.
    #[error("could not generate a unique license key after {0} attempts")]
    KeyGenerationExhausted(u32),

    /// Key store or audit log error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
