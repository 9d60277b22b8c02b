//! Client library for the Licensy verification API.
//!
//! A protected application uses [`LicenseClient::check`] to ask the
//! verification server whether a key is valid. The answer is one of
//! [`CheckOutcome::Valid`], [`CheckOutcome::Invalid`] or
//! [`CheckOutcome::Unknown`].
//!
//! `Unknown` means the server could not be reached, refused our
//! credentials, or answered ambiguously. It is denied by default; see
//! [`UnknownPolicy`].
//!
//! Transient failures (transport errors, timeouts, `5xx`) are retried with
//! bounded exponential backoff.

mod client;
mod config;
mod error;

pub use client::{CheckOutcome, InvalidKind, LicenseClient};
pub use config::{ClientConfig, ClientCredentials, UnknownPolicy};
pub use error::{ClientError, ClientResult};
