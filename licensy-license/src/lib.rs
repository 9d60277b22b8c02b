//! License validation and issuance for Licensy.
//!
//! This crate handles:
//! - Turning a presented key into a verdict, with exactly one audit entry
//!   per validation attempt
//! - Issuing new licenses (explicit or generated keys) and revoking them
//!
//! # Design Principles
//!
//! - **Fail closed**: a key is reported valid only after its audit entry is
//!   durably appended. Any storage failure or timeout yields an error
//!   verdict, never a valid one
//! - **No normalization**: keys are compared exactly as presented
//! - **No server-side retries**: retry policy belongs to the caller
//! - **Narrow mutation surface**: issue and revoke are the only writes

mod error;
mod issuer;
mod validator;
mod verdict;

pub use error::{LicenseError, LicenseResult};
pub use issuer::{generate_key, validate_key_format, LicenseIssuer, MAX_KEY_LEN};
pub use validator::{Validator, DEFAULT_STORE_TIMEOUT};
pub use verdict::{InvalidReason, KeyVerdict, Verdict};
