//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a protected application treats an `Unknown` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Treat `Unknown` as invalid.
    #[default]
    Deny,
    /// Treat `Unknown` as valid. Only for applications that explicitly
    /// accept running unlicensed during a verification outage.
    Allow,
}

/// Settings for [`LicenseClient`](crate::LicenseClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the verification server (e.g. `https://licensy.example.com`).
    pub base_url: String,
    /// Total attempts per check, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles on every further retry.
    #[serde(with = "millis")]
    pub initial_backoff: Duration,
    /// Upper bound for a single backoff delay.
    #[serde(with = "millis")]
    pub max_backoff: Duration,
    /// Timeout for one HTTP request.
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    /// What `is_permitted` answers for `Unknown`.
    pub unknown_policy: UnknownPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            unknown_policy: UnknownPolicy::Deny,
        }
    }
}

impl ClientConfig {
    /// Creates a config for `base_url` with default retry settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Backoff before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Credentials identifying the calling service to the server.
#[derive(Clone)]
pub enum ClientCredentials {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `Authorization: Basic <base64(username:password)>`.
    Basic { username: String, password: String },
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
