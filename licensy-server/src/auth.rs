//! Caller authentication.
//!
//! Credentials arrive in the `Authorization` header in one of three shapes:
//! `Bearer <token>`, `Basic <base64(user:pass)>`, or a bare token with no
//! scheme. Secrets are never held in memory in the clear; only their
//! SHA-256 digests are kept.

use crate::config::{CallerConfig, CallerCredential};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use licensy_types::CallerId;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Credentials presented with a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
    /// Header value without a recognised scheme.
    Raw(String),
}

impl Credentials {
    /// Parses an `Authorization` header value.
    ///
    /// Returns `None` for an empty value or an undecodable `Basic` payload.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Some(token) = strip_scheme(value, "Bearer") {
            return (!token.is_empty()).then(|| Self::Bearer(token.to_string()));
        }
        if let Some(payload) = strip_scheme(value, "Basic") {
            let decoded = STANDARD.decode(payload).ok()?;
            let decoded = String::from_utf8(decoded).ok()?;
            let (username, password) = decoded.split_once(':')?;
            return Some(Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            });
        }
        Some(Self::Raw(value.to_string()))
    }

    /// Extracts credentials from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}, <redacted>)"),
            Self::Raw(_) => f.write_str("Raw(<redacted>)"),
        }
    }
}

fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (head, rest) = value.split_once(' ').unwrap_or((value, ""));
    head.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}

fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Resolves presented credentials to a caller identity.
pub trait Authenticator: Send + Sync {
    /// Returns the authenticated caller, or `None` if the credentials are
    /// not recognised.
    fn authenticate(&self, credentials: &Credentials) -> Option<CallerId>;
}

/// Authenticator over a fixed set of configured callers.
///
/// A raw header value is treated as a bearer token.
#[derive(Default)]
pub struct CredentialAuthenticator {
    tokens: HashMap<String, CallerId>,
    logins: HashMap<String, (String, CallerId)>,
}

impl CredentialAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an authenticator from configured callers.
    pub fn from_config(callers: &[CallerConfig]) -> Self {
        let mut auth = Self::new();
        for caller in callers {
            let id = CallerId::new(caller.name.clone());
            match &caller.credential {
                CallerCredential::Bearer { token } => auth.add_bearer(token, id),
                CallerCredential::Basic { username, password } => {
                    auth.add_basic(username, password, id);
                }
            }
        }
        auth
    }

    /// Registers a bearer token for `caller`.
    pub fn add_bearer(&mut self, token: &str, caller: CallerId) {
        self.tokens.insert(digest(token), caller);
    }

    /// Registers a username/password pair for `caller`.
    pub fn add_basic(&mut self, username: &str, password: &str, caller: CallerId) {
        self.logins
            .insert(username.to_string(), (digest(password), caller));
    }

    /// Number of registered credentials.
    pub fn len(&self) -> usize {
        self.tokens.len() + self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Authenticator for CredentialAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Option<CallerId> {
        match credentials {
            Credentials::Bearer(token) | Credentials::Raw(token) => {
                self.tokens.get(&digest(token)).cloned()
            }
            Credentials::Basic { username, password } => self
                .logins
                .get(username)
                .filter(|(expected, _)| *expected == digest(password))
                .map(|(_, caller)| caller.clone()),
        }
    }
}

/// The administrative key guarding the license management routes.
///
/// Accepted as a bearer token or as the raw header value.
#[derive(Clone)]
pub struct AdminKey {
    digest: String,
}

impl AdminKey {
    pub fn new(key: &str) -> Self {
        Self {
            digest: digest(key),
        }
    }

    /// Returns true if `credentials` carry the admin key.
    pub fn matches(&self, credentials: &Credentials) -> bool {
        match credentials {
            Credentials::Bearer(key) | Credentials::Raw(key) => digest(key) == self.digest,
            Credentials::Basic { .. } => false,
        }
    }
}
