//! Error types for the client.
//!
//! These never escape [`LicenseClient::check`](crate::LicenseClient::check),
//! which folds every failure into `CheckOutcome::Unknown`. They are public
//! for callers of [`LicenseClient::verify_raw`](crate::LicenseClient::verify_raw).

use licensy_types::wire::VerdictBody;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the verification server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Network error or request timeout.
    #[error("network error: {0}")]
    Transport(String),

    /// The server could not process the batch right now (`5xx`).
    ///
    /// A `503` from the verification endpoint still carries per-key
    /// verdicts; they are kept in `partial`.
    #[error("server unavailable (HTTP {status})")]
    Unavailable {
        status: u16,
        partial: Option<Vec<VerdictBody>>,
    },

    /// The server rejected our credentials.
    #[error("authentication error: caller credentials rejected")]
    Unauthorized,

    /// The server rejected the request itself.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response did not match the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Unavailable { .. })
    }
}
