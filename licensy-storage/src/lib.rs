//! Key store and audit log for Licensy.
//!
//! Both components sit on top of a minimal persistence collaborator,
//! [`RecordStore`], which offers single-key reads, atomic single-key
//! writes and ordered scans. Two backends ship with the crate:
//!
//! - [`SqliteRecordStore`]: durable, one `records` table in a SQLite file
//! - [`MemoryRecordStore`]: process-local, for tests and ephemeral servers
//!
//! # Invariants
//!
//! - License records are never deleted; the only mutation is revocation
//! - The audit log is append-only; entry IDs and timestamps never decrease
//! - A failed audit append is always reported to the caller

mod audit_log;
mod error;
mod key_store;
mod record_store;
mod sqlite;

pub use audit_log::{AuditLog, AuditQuery, USAGE_NAMESPACE};
pub use error::{StoreError, StoreResult};
pub use key_store::{KeyStore, LICENSES_NAMESPACE};
pub use record_store::{mock, MemoryRecordStore, RecordStore, ScanPredicate};
pub use sqlite::SqliteRecordStore;
