//! HTTP client for the verification endpoint.

use crate::config::{ClientConfig, ClientCredentials, UnknownPolicy};
use crate::error::{ClientError, ClientResult};
use licensy_types::wire::{ErrorBody, VerdictBody, VerdictReason, VerdictStatus, VERIFY_PATH};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

/// Why the server considers a key invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidKind {
    UnknownKey,
    Revoked,
}

/// Result of checking one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckOutcome {
    /// The server confirmed the key is active.
    Valid,
    /// The server confirmed the key is not valid.
    Invalid(InvalidKind),
    /// Validity could not be established.
    Unknown,
}

/// Client for the Licensy verification API.
pub struct LicenseClient {
    config: ClientConfig,
    credentials: ClientCredentials,
    http: Client,
    verify_url: String,
}

impl LicenseClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] if the configuration is unusable.
    pub fn new(config: ClientConfig, credentials: ClientCredentials) -> ClientResult<Self> {
        if config.max_attempts == 0 {
            return Err(ClientError::Config("max_attempts must be at least 1".to_string()));
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {e}")))?;
        let verify_url = format!("{}{}", config.base_url.trim_end_matches('/'), VERIFY_PATH);

        Ok(Self {
            config,
            credentials,
            http,
            verify_url,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Checks one key.
    ///
    /// The key is sent exactly as given.
    pub async fn check(&self, key: &str) -> CheckOutcome {
        self.check_many(&[key.to_string()])
            .await
            .into_iter()
            .next()
            .unwrap_or(CheckOutcome::Unknown)
    }

    /// Checks several keys in one request. Outcomes are in input order.
    pub async fn check_many(&self, keys: &[String]) -> Vec<CheckOutcome> {
        if keys.is_empty() {
            return Vec::new();
        }

        let verdicts = match self.verify_raw(keys).await {
            Ok(verdicts) => verdicts,
            Err(ClientError::Unavailable {
                partial: Some(verdicts),
                ..
            }) => verdicts,
            Err(e) => {
                warn!("license check failed, outcome unknown: {e}");
                return vec![CheckOutcome::Unknown; keys.len()];
            }
        };

        interpret(keys, &verdicts)
    }

    /// Returns whether an outcome should let the application proceed.
    #[must_use]
    pub fn is_permitted(&self, outcome: CheckOutcome) -> bool {
        match outcome {
            CheckOutcome::Valid => true,
            CheckOutcome::Invalid(_) => false,
            CheckOutcome::Unknown => self.config.unknown_policy == UnknownPolicy::Allow,
        }
    }

    /// Sends `keys` to the verification endpoint, retrying transient
    /// failures, and returns the raw verdicts.
    pub async fn verify_raw(&self, keys: &[String]) -> ClientResult<Vec<VerdictBody>> {
        let mut attempt = 1;
        loop {
            match self.send_once(keys).await {
                Ok(verdicts) => return Ok(verdicts),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.config.backoff_for(attempt);
                    info!(
                        "verification attempt {attempt}/{} failed ({e}), retrying in {delay:?}",
                        self.config.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, keys: &[String]) -> ClientResult<Vec<VerdictBody>> {
        let request = self.http.post(&self.verify_url).json(keys);
        let request = match &self.credentials {
            ClientCredentials::Bearer(token) => request.bearer_auth(token),
            ClientCredentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        debug!("verification endpoint answered {status}");

        match status {
            StatusCode::OK => response
                .json::<Vec<VerdictBody>>()
                .await
                .map_err(|e| ClientError::Protocol(format!("invalid verdict body: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            StatusCode::SERVICE_UNAVAILABLE => Err(ClientError::Unavailable {
                status: status.as_u16(),
                partial: response.json::<Vec<VerdictBody>>().await.ok(),
            }),
            s if s.is_server_error() => Err(ClientError::Unavailable {
                status: s.as_u16(),
                partial: None,
            }),
            s => {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_default();
                Err(ClientError::Rejected {
                    status: s.as_u16(),
                    message,
                })
            }
        }
    }
}

/// Maps server verdicts onto the requested keys, failing closed on any
/// mismatch.
fn interpret(keys: &[String], verdicts: &[VerdictBody]) -> Vec<CheckOutcome> {
    if verdicts.len() != keys.len() {
        warn!(
            "server returned {} verdicts for {} keys, treating all as unknown",
            verdicts.len(),
            keys.len()
        );
        return vec![CheckOutcome::Unknown; keys.len()];
    }

    keys.iter()
        .zip(verdicts)
        .map(|(key, verdict)| {
            if &verdict.key != key {
                warn!("verdict for {:?} answered key {:?}", key, verdict.key);
                return CheckOutcome::Unknown;
            }
            match (verdict.status, verdict.reason) {
                (VerdictStatus::Valid, None) => CheckOutcome::Valid,
                (VerdictStatus::Invalid, Some(VerdictReason::UnknownKey)) => {
                    CheckOutcome::Invalid(InvalidKind::UnknownKey)
                }
                (VerdictStatus::Invalid, Some(VerdictReason::Revoked)) => {
                    CheckOutcome::Invalid(InvalidKind::Revoked)
                }
                _ => CheckOutcome::Unknown,
            }
        })
        .collect()
}
