//! Shared test helpers for license tests.

#![allow(dead_code)]

use licensy_license::{LicenseIssuer, Validator};
use licensy_storage::{mock::FlakyRecordStore, AuditLog, KeyStore, MemoryRecordStore, RecordStore};
use licensy_types::{CallerId, LicenseKey};
use std::sync::Arc;

/// Everything a validation test needs, over one fault-injecting store.
pub struct Harness {
    pub store: Arc<FlakyRecordStore<MemoryRecordStore>>,
    pub keys: Arc<KeyStore>,
    pub audit: Arc<AuditLog>,
    pub validator: Validator,
    pub issuer: LicenseIssuer,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(FlakyRecordStore::new(MemoryRecordStore::new()));
        let shared: Arc<dyn RecordStore> = store.clone();
        let keys = Arc::new(KeyStore::new(shared.clone()));
        let audit = Arc::new(AuditLog::open(shared).unwrap());
        Self {
            validator: Validator::new(keys.clone(), audit.clone()),
            issuer: LicenseIssuer::new(keys.clone(), audit.clone()),
            store,
            keys,
            audit,
        }
    }

    /// Issues an active license under `key`.
    pub fn active(&self, key: &str) -> LicenseKey {
        self.issuer.issue(&"acct-1".into(), Some(key)).unwrap();
        LicenseKey::from(key)
    }

    /// Issues and revokes a license under `key`.
    pub fn revoked(&self, key: &str) -> LicenseKey {
        let key = self.active(key);
        self.issuer.revoke(&key).unwrap();
        key
    }
}

pub fn caller() -> CallerId {
    CallerId::new("billing-service")
}
