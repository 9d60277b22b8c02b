//! Shared test helpers for storage tests.

#![allow(dead_code)]

use licensy_storage::{
    mock::FlakyRecordStore, AuditLog, KeyStore, MemoryRecordStore, RecordStore,
};
use licensy_types::{CallerId, LicenseKey, NewUsageEntry, OwnerId, UsageAction};
use std::sync::Arc;

/// Returns a key store and audit log sharing one in-memory record store.
pub fn memory_stores() -> (KeyStore, AuditLog) {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    (
        KeyStore::new(store.clone()),
        AuditLog::open(store).unwrap(),
    )
}

/// Returns a fault-injecting store and handles over it.
pub fn flaky_stores() -> (Arc<FlakyRecordStore<MemoryRecordStore>>, KeyStore, AuditLog) {
    let flaky = Arc::new(FlakyRecordStore::new(MemoryRecordStore::new()));
    let store: Arc<dyn RecordStore> = flaky.clone();
    (
        flaky,
        KeyStore::new(store.clone()),
        AuditLog::open(store).unwrap(),
    )
}

pub fn key(s: &str) -> LicenseKey {
    LicenseKey::from(s)
}

pub fn owner(s: &str) -> OwnerId {
    OwnerId::new(s)
}

pub fn entry(key: &str, action: UsageAction) -> NewUsageEntry {
    NewUsageEntry::new(LicenseKey::from(key), action, CallerId::new("test-service"))
}
