//! Usage log entries.
//!
//! One entry is written per validation attempt. Entries are immutable once
//! written and reference a license by key only; the license does not own
//! its history.

use crate::{CallerId, EntryId, Error, LicenseKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a validation attempt, as recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    /// The key was found and active.
    CheckSuccess,
    /// The key is not in the key store.
    CheckFailureUnknownKey,
    /// The key exists but has been revoked.
    CheckFailureRevoked,
}

impl UsageAction {
    /// Returns the storage name of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckSuccess => "check_success",
            Self::CheckFailureUnknownKey => "check_failure_unknown_key",
            Self::CheckFailureRevoked => "check_failure_revoked",
        }
    }
}

impl fmt::Display for UsageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check_success" => Ok(Self::CheckSuccess),
            "check_failure_unknown_key" => Ok(Self::CheckFailureUnknownKey),
            "check_failure_revoked" => Ok(Self::CheckFailureRevoked),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

/// An entry to be appended. The log assigns the ID and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUsageEntry {
    pub license_key: LicenseKey,
    pub action: UsageAction,
    pub caller_identity: CallerId,
}

impl NewUsageEntry {
    #[must_use]
    pub fn new(license_key: LicenseKey, action: UsageAction, caller_identity: CallerId) -> Self {
        Self {
            license_key,
            action,
            caller_identity,
        }
    }
}

/// A persisted usage log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Sequence number within the log.
    pub id: EntryId,
    /// The key that was presented. May not resolve to a license.
    pub license_key: LicenseKey,
    /// Write time, non-decreasing within one log.
    pub timestamp: DateTime<Utc>,
    /// What the validation concluded.
    pub action: UsageAction,
    /// The service that asked.
    pub caller_identity: CallerId,
}

impl UsageLogEntry {
    /// Stamps a new entry with its ID and write time.
    #[must_use]
    pub fn stamp(entry: NewUsageEntry, id: EntryId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            license_key: entry.license_key,
            timestamp,
            action: entry.action,
            caller_identity: entry.caller_identity,
        }
    }
}
