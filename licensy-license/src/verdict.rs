//! Verdicts produced by the validator.

use licensy_types::wire::{VerdictBody, VerdictReason, VerdictStatus};
use licensy_types::{LicenseKey, UsageAction};

/// Why a key is not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// No license was ever issued under this key.
    UnknownKey,
    /// The license exists but has been revoked.
    Revoked,
}

/// Outcome of validating one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The key is active and the check has been recorded.
    Valid,
    /// The key is definitely not valid.
    Invalid(InvalidReason),
    /// Validity could not be determined or could not be recorded.
    Error,
}

impl Verdict {
    /// Returns true only for [`Verdict::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns true for [`Verdict::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// The audit action recording this verdict, if any.
    ///
    /// Error verdicts have no action: nothing was determined.
    #[must_use]
    pub fn usage_action(&self) -> Option<UsageAction> {
        match self {
            Self::Valid => Some(UsageAction::CheckSuccess),
            Self::Invalid(InvalidReason::UnknownKey) => Some(UsageAction::CheckFailureUnknownKey),
            Self::Invalid(InvalidReason::Revoked) => Some(UsageAction::CheckFailureRevoked),
            Self::Error => None,
        }
    }

    /// Wire status and reason for this verdict.
    #[must_use]
    pub fn wire_parts(&self) -> (VerdictStatus, Option<VerdictReason>) {
        match self {
            Self::Valid => (VerdictStatus::Valid, None),
            Self::Invalid(InvalidReason::UnknownKey) => {
                (VerdictStatus::Invalid, Some(VerdictReason::UnknownKey))
            }
            Self::Invalid(InvalidReason::Revoked) => {
                (VerdictStatus::Invalid, Some(VerdictReason::Revoked))
            }
            Self::Error => (VerdictStatus::Error, Some(VerdictReason::InternalError)),
        }
    }
}

/// A verdict paired with the key it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVerdict {
    pub key: LicenseKey,
    pub verdict: Verdict,
}

impl KeyVerdict {
    #[must_use]
    pub fn new(key: LicenseKey, verdict: Verdict) -> Self {
        Self { key, verdict }
    }

    /// Converts into the JSON body sent to clients.
    #[must_use]
    pub fn into_wire(self) -> VerdictBody {
        let (status, reason) = self.verdict.wire_parts();
        VerdictBody {
            key: self.key.into_inner(),
            status,
            reason,
        }
    }
}
