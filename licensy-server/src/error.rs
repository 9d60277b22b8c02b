//! Error types for the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use licensy_license::LicenseError;
use licensy_storage::StoreError;
use licensy_types::wire::ErrorBody;
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// Rejections of a verify request as a whole.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// Missing or unrecognised credentials. No key was processed.
    #[error("unauthorized")]
    Unauthorized,

    /// Empty batch, or more keys than the configured maximum.
    #[error("malformed batch: {0}")]
    MalformedBatch(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// An error answered to an HTTP client as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage unavailable")]
    Unavailable,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

impl From<EndpointError> for ApiError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Unauthorized => Self::Unauthorized,
            EndpointError::MalformedBatch(msg) => Self::BadRequest(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => Self::NotFound(format!("license not found: {key}")),
            StoreError::DuplicateKey(key) => Self::Conflict(format!("license already exists: {key}")),
            StoreError::AlreadyRevoked(key) => {
                Self::Conflict(format!("license already revoked: {key}"))
            }
            e => {
                error!("storage failure: {e}");
                Self::Unavailable
            }
        }
    }
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::InvalidKeyFormat(_) | LicenseError::InvalidOwner(_) => {
                Self::BadRequest(err.to_string())
            }
            LicenseError::Store(e) => e.into(),
            LicenseError::KeyGenerationExhausted(_) => {
                error!("{err}");
                Self::Internal
            }
        }
    }
}
