//! Batch verification over the validator.

use crate::auth::{Authenticator, Credentials};
use crate::error::EndpointError;
use licensy_license::{KeyVerdict, Validator, Verdict};
use licensy_types::{CallerId, LicenseKey};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Default largest batch accepted by [`VerificationEndpoint::verify`].
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Authenticates callers and fans a batch of keys out to the validator.
#[derive(Clone)]
pub struct VerificationEndpoint {
    validator: Validator,
    authenticator: Arc<dyn Authenticator>,
    max_batch_size: usize,
}

impl VerificationEndpoint {
    pub fn new(validator: Validator, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            validator,
            authenticator,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Resolves the caller behind `credentials`.
    pub fn authenticate(
        &self,
        credentials: Option<&Credentials>,
    ) -> Result<CallerId, EndpointError> {
        let Some(credentials) = credentials else {
            warn!("verify request without credentials");
            return Err(EndpointError::Unauthorized);
        };
        self.authenticator.authenticate(credentials).ok_or_else(|| {
            warn!("verify request with unrecognised credentials: {credentials:?}");
            EndpointError::Unauthorized
        })
    }

    /// Validates `keys` on behalf of the authenticated caller.
    ///
    /// Verdicts come back in input order. Each key is validated on its own
    /// task; dropping the returned future does not cancel validations that
    /// have already been spawned, so their audit entries are still written.
    pub async fn verify(
        &self,
        credentials: Option<&Credentials>,
        keys: Vec<String>,
    ) -> Result<Vec<KeyVerdict>, EndpointError> {
        let caller = self.authenticate(credentials)?;
        self.check_batch(&keys)?;
        debug!("{caller} verifying {} key(s)", keys.len());

        let tasks: Vec<_> = keys
            .into_iter()
            .map(LicenseKey::from)
            .map(|key| {
                let validator = self.validator.clone();
                let caller = caller.clone();
                let task_key = key.clone();
                let handle = tokio::spawn(async move {
                    let verdict = validator.validate(&task_key, &caller).await;
                    KeyVerdict::new(task_key, verdict)
                });
                (key, handle)
            })
            .collect();

        let mut verdicts = Vec::with_capacity(tasks.len());
        for (key, handle) in tasks {
            match handle.await {
                Ok(verdict) => verdicts.push(verdict),
                Err(e) => {
                    error!("validation task for key {key} failed: {e}");
                    verdicts.push(KeyVerdict::new(key, Verdict::Error));
                }
            }
        }
        Ok(verdicts)
    }

    fn check_batch(&self, keys: &[String]) -> Result<(), EndpointError> {
        if keys.is_empty() {
            return Err(EndpointError::MalformedBatch("batch is empty".to_string()));
        }
        if keys.len() > self.max_batch_size {
            return Err(EndpointError::MalformedBatch(format!(
                "batch has {} keys, maximum is {}",
                keys.len(),
                self.max_batch_size
            )));
        }
        Ok(())
    }
}
