//! Core type definitions for Licensy.
//!
//! This crate defines the plain data shared by every other crate:
//! - License records and their lifecycle status
//! - Usage log entries (one per validation attempt)
//! - Identifier newtypes for keys, owners and callers
//! - The monotonic clock used to stamp audit entries
//! - Wire DTOs exchanged between the verification server and its clients
//!
//! Nothing here performs I/O.

mod ids;
mod license;
mod timestamp;
mod usage;
pub mod wire;

pub use ids::{CallerId, EntryId, LicenseKey, OwnerId};
pub use license::{License, LicenseStatus};
pub use timestamp::MonotonicClock;
pub use usage::{NewUsageEntry, UsageAction, UsageLogEntry};

/// Errors from parsing stored names back into types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown usage action: {0}")]
    UnknownAction(String),

    #[error("unknown license status: {0}")]
    UnknownStatus(String),
}
