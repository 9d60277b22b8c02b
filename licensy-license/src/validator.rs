//! Converts a presented key into a verdict.
//!
//! The validator is the only component that writes to the audit log. For
//! every call it attempts exactly one append, and it returns its verdict
//! only after that append has succeeded. If the lookup or the append fails
//! or times out, the verdict is [`Verdict::Error`].

use crate::verdict::{InvalidReason, Verdict};
use licensy_storage::{AuditLog, KeyStore, StoreError, StoreResult};
use licensy_types::{CallerId, EntryId, LicenseKey, LicenseStatus, NewUsageEntry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Deadline applied to each key store or audit log access.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Stateless validation logic over a key store and an audit log.
#[derive(Clone)]
pub struct Validator {
    keys: Arc<KeyStore>,
    audit: Arc<AuditLog>,
    store_timeout: Duration,
}

impl Validator {
    /// Creates a validator with the default store timeout.
    pub fn new(keys: Arc<KeyStore>, audit: Arc<AuditLog>) -> Self {
        Self {
            keys,
            audit,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the deadline for each store access.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Returns the configured store timeout.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Validates `key` on behalf of `caller`.
    ///
    /// The key is looked up exactly as given. Store work runs on the
    /// blocking pool, so an audit append that has started will finish even
    /// if the returned future is dropped.
    pub async fn validate(&self, key: &LicenseKey, caller: &CallerId) -> Verdict {
        let status = match self.lookup(key).await {
            Ok(status) => status,
            Err(e) => {
                error!("lookup of key {key} failed, reporting error: {e}");
                return Verdict::Error;
            }
        };

        let verdict = match status {
            Some(LicenseStatus::Active) => Verdict::Valid,
            Some(LicenseStatus::Revoked) => Verdict::Invalid(InvalidReason::Revoked),
            None => Verdict::Invalid(InvalidReason::UnknownKey),
        };
        let Some(action) = verdict.usage_action() else {
            return Verdict::Error;
        };

        let entry = NewUsageEntry::new(key.clone(), action, caller.clone());
        match self.record(entry).await {
            Ok(id) => {
                debug!("key {key} checked by {caller}: {action} (entry {id})");
                verdict
            }
            Err(e) => {
                warn!("audit append for key {key} failed, failing closed: {e}");
                Verdict::Error
            }
        }
    }

    /// Resolves the key's status; `None` means the key was never issued.
    async fn lookup(&self, key: &LicenseKey) -> StoreResult<Option<LicenseStatus>> {
        let keys = self.keys.clone();
        let key = key.clone();
        self.run_blocking(move || {
            if keys.exists_active(&key)? {
                return Ok(Some(LicenseStatus::Active));
            }
            match keys.get(&key) {
                Ok(license) => Ok(Some(license.status)),
                Err(StoreError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn record(&self, entry: NewUsageEntry) -> StoreResult<EntryId> {
        let audit = self.audit.clone();
        self.run_blocking(move || audit.append(entry)).await
    }

    async fn run_blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce() -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.store_timeout, tokio::task::spawn_blocking(op)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(StoreError::StorageUnavailable(format!(
                "store task failed: {join_err}"
            ))),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}
