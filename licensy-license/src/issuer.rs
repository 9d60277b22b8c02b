//! License issuance and revocation.
//!
//! These are the only mutations the system exposes. There is no update
//! and no delete: a key, once issued, stays in the key store forever so
//! that its audit history always resolves.
//!
//! Generated keys look like `7KQ2M-XH4PA-9TRWE-CN3JD`: four groups of five
//! characters from an alphabet without `0/O` or `1/I`, giving 100 bits of
//! entropy.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use licensy_storage::{AuditLog, KeyStore, StoreError};
use licensy_types::{License, LicenseKey, OwnerId, UsageLogEntry};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum length of a license key, in characters.
pub const MAX_KEY_LEN: usize = 100;

const KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const KEY_GROUPS: usize = 4;
const KEY_GROUP_LEN: usize = 5;
const MAX_GENERATION_ATTEMPTS: u32 = 5;

/// Generates a random license key.
#[must_use]
pub fn generate_key() -> LicenseKey {
    let mut rng = rand::thread_rng();
    let groups: Vec<String> = (0..KEY_GROUPS)
        .map(|_| {
            (0..KEY_GROUP_LEN)
                .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
                .collect()
        })
        .collect();
    LicenseKey::new(groups.join("-"))
}

/// Checks that a caller-supplied key may be issued.
///
/// Keys must be non-empty, at most [`MAX_KEY_LEN`] characters and free of
/// control characters. The key is not trimmed or otherwise altered.
pub fn validate_key_format(raw: &str) -> LicenseResult<()> {
    if raw.is_empty() {
        return Err(LicenseError::InvalidKeyFormat("key must not be empty".to_string()));
    }
    let len = raw.chars().count();
    if len > MAX_KEY_LEN {
        return Err(LicenseError::InvalidKeyFormat(format!(
            "key is {len} characters, maximum is {MAX_KEY_LEN}"
        )));
    }
    if raw.chars().any(char::is_control) {
        return Err(LicenseError::InvalidKeyFormat(
            "key must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Administrative entry points over the key store and audit log.
#[derive(Clone)]
pub struct LicenseIssuer {
    keys: Arc<KeyStore>,
    audit: Arc<AuditLog>,
}

impl LicenseIssuer {
    pub fn new(keys: Arc<KeyStore>, audit: Arc<AuditLog>) -> Self {
        Self { keys, audit }
    }

    /// Issues a license to `owner`.
    ///
    /// Uses `key` verbatim when given, otherwise generates one.
    ///
    /// # Errors
    ///
    /// [`LicenseError::InvalidKeyFormat`] for unacceptable keys, and
    /// [`StoreError::DuplicateKey`] (wrapped) when an explicit key was
    /// issued before.
    pub fn issue(&self, owner: &OwnerId, key: Option<&str>) -> LicenseResult<License> {
        if owner.as_str().trim().is_empty() {
            return Err(LicenseError::InvalidOwner("owner must not be empty".to_string()));
        }

        if let Some(raw) = key {
            validate_key_format(raw)?;
            return Ok(self.keys.put(&LicenseKey::from(raw), owner)?);
        }

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            match self.keys.put(&generate_key(), owner) {
                Ok(license) => return Ok(license),
                Err(StoreError::DuplicateKey(k)) => {
                    warn!("generated key {k} collided (attempt {attempt})");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(LicenseError::KeyGenerationExhausted(MAX_GENERATION_ATTEMPTS))
    }

    /// Revokes a license. Revocation is permanent.
    pub fn revoke(&self, key: &LicenseKey) -> LicenseResult<License> {
        let license = self.keys.revoke(key)?;
        info!("license {} for {} is now revoked", license.key, license.owner);
        Ok(license)
    }

    /// Fetches a license by exact key.
    pub fn get(&self, key: &LicenseKey) -> LicenseResult<License> {
        Ok(self.keys.get(key)?)
    }

    /// Lists licenses, optionally only those of one owner.
    pub fn list(&self, owner: Option<&OwnerId>) -> LicenseResult<Vec<License>> {
        Ok(self.keys.list(owner)?)
    }

    /// Returns the validation history of `key` between `from` and `to`.
    ///
    /// Works for any presented key, including ones that were never issued.
    pub fn usage(
        &self,
        key: &LicenseKey,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LicenseResult<Vec<UsageLogEntry>> {
        Ok(self
            .audit
            .query(key, from, to)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
