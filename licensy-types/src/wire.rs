//! JSON bodies exchanged over the verification API.
//!
//! The verify request body is a bare JSON array of key strings; the
//! response is a JSON array of [`VerdictBody`] in request order.

use serde::{Deserialize, Serialize};

/// Path of the verification endpoint.
pub const VERIFY_PATH: &str = "/api/v1/verify";

/// Path prefix of the license administration endpoints.
pub const LICENSES_PATH: &str = "/api/v1/licenses";

/// Coarse verdict on one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Valid,
    Invalid,
    /// Validity could not be determined. Never to be read as valid.
    Error,
}

/// Why a key was not reported valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    UnknownKey,
    Revoked,
    InternalError,
}

/// One entry of the verify response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictBody {
    pub key: String,
    pub status: VerdictStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerdictReason>,
}

/// Body of `POST /api/v1/licenses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLicenseRequest {
    pub owner: String,
    /// Explicit key to issue. A key is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
