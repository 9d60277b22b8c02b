//! License records and their lifecycle.

use crate::{Error, LicenseKey, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a license.
///
/// The only transition is `Active -> Revoked`. Revocation is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// The key is valid for use.
    Active,
    /// The key has been withdrawn and can never become active again.
    Revoked,
}

impl LicenseStatus {
    /// Returns the wire/storage name of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

/// A license record bound to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Unique key, immutable once issued.
    pub key: LicenseKey,
    /// Account the license belongs to.
    pub owner: OwnerId,
    /// Current lifecycle state.
    pub status: LicenseStatus,
    /// When the license was issued.
    pub issued_at: DateTime<Utc>,
    /// When the license record last changed.
    pub updated_at: DateTime<Utc>,
}

impl License {
    /// Creates a freshly issued, active license.
    #[must_use]
    pub fn issue(key: LicenseKey, owner: OwnerId, now: DateTime<Utc>) -> Self {
        Self {
            key,
            owner,
            status: LicenseStatus::Active,
            issued_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the license is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }

    /// Moves the license to `Revoked`.
    ///
    /// Returns `false` without touching the record if it is already revoked.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == LicenseStatus::Revoked {
            return false;
        }
        self.status = LicenseStatus::Revoked;
        self.updated_at = now.max(self.updated_at);
        true
    }
}
