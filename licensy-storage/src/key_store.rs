//! Durable mapping from license key to owner and status.
//!
//! The key store is the single source of truth for whether a key exists
//! and is active. Records are never removed; the only mutation after
//! issuance is the terminal `active -> revoked` transition.

use crate::error::{StoreError, StoreResult};
use crate::record_store::RecordStore;
use chrono::Utc;
use licensy_types::{License, LicenseKey, OwnerId};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Namespace holding license records, keyed by the raw license key.
pub const LICENSES_NAMESPACE: &str = "licenses";

const LIST_PAGE_SIZE: usize = 500;

/// License records on top of a [`RecordStore`].
pub struct KeyStore {
    store: Arc<dyn RecordStore>,
    /// Serializes read-check-write sequences (`put`, `revoke`).
    write_lock: Mutex<()>,
}

impl KeyStore {
    /// Creates a key store over the given record store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Issues a new active license.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] if the key was ever issued before,
    /// including keys that have since been revoked.
    pub fn put(&self, key: &LicenseKey, owner: &OwnerId) -> StoreResult<License> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.find(key)?.is_some() {
            return Err(StoreError::DuplicateKey(key.to_string()));
        }

        let license = License::issue(key.clone(), owner.clone(), Utc::now());
        self.save(&license)?;
        info!("issued license {} to {}", key, owner);
        Ok(license)
    }

    /// Fetches a license by key.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no license has this exact key.
    pub fn get(&self, key: &LicenseKey) -> StoreResult<License> {
        self.find(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Revokes an active license.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown keys, and
    /// [`StoreError::AlreadyRevoked`] if the license is already revoked.
    /// Of several concurrent revocations of one key exactly one succeeds.
    pub fn revoke(&self, key: &LicenseKey) -> StoreResult<License> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut license = self.get(key)?;
        if !license.revoke(Utc::now()) {
            return Err(StoreError::AlreadyRevoked(key.to_string()));
        }
        self.save(&license)?;
        info!("revoked license {}", key);
        Ok(license)
    }

    /// Returns true if the key exists and is active.
    pub fn exists_active(&self, key: &LicenseKey) -> StoreResult<bool> {
        Ok(self.find(key)?.is_some_and(|license| license.is_active()))
    }

    /// Lists licenses in key order, optionally restricted to one owner.
    pub fn list(&self, owner: Option<&OwnerId>) -> StoreResult<Vec<License>> {
        let mut licenses = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page = self.store.scan(
                LICENSES_NAMESPACE,
                after.as_deref(),
                LIST_PAGE_SIZE,
                &|_, _| true,
            )?;
            let exhausted = page.len() < LIST_PAGE_SIZE;

            for (key, record) in page {
                let license = decode(&key, &record)?;
                if owner.is_none_or(|owner| &license.owner == owner) {
                    licenses.push(license);
                }
                after = Some(key);
            }

            if exhausted {
                break;
            }
        }

        debug!("listed {} licenses", licenses.len());
        Ok(licenses)
    }

    fn find(&self, key: &LicenseKey) -> StoreResult<Option<License>> {
        self.store
            .read(LICENSES_NAMESPACE, key.as_str())?
            .map(|record| decode(key.as_str(), &record))
            .transpose()
    }

    fn save(&self, license: &License) -> StoreResult<()> {
        let record = serde_json::to_string(license).map_err(|e| StoreError::Corrupt {
            key: license.key.to_string(),
            reason: e.to_string(),
        })?;
        self.store
            .write(LICENSES_NAMESPACE, license.key.as_str(), &record)
    }
}

fn decode(key: &str, record: &str) -> StoreResult<License> {
    serde_json::from_str(record).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
