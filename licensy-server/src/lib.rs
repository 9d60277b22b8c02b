//! HTTP server for Licensy.
//!
//! Serves the verification endpoint used by protected applications and the
//! administrative routes used to issue, inspect and revoke licenses.

pub mod auth;
pub mod config;
mod endpoint;
mod error;
pub mod routes;

pub use auth::{AdminKey, Authenticator, CredentialAuthenticator, Credentials};
pub use config::{CallerConfig, CallerCredential, ServerConfig};
pub use endpoint::{VerificationEndpoint, DEFAULT_MAX_BATCH_SIZE};
pub use error::{ApiError, ConfigError, EndpointError};

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use licensy_license::{LicenseIssuer, Validator};
use licensy_storage::{AuditLog, KeyStore, RecordStore, StoreResult};
use licensy_types::wire::{LICENSES_PATH, VERIFY_PATH};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub endpoint: VerificationEndpoint,
    pub issuer: LicenseIssuer,
    pub admin: Option<AdminKey>,
}

impl AppState {
    /// Wires the key store, audit log and authenticators over `store`.
    ///
    /// Opening the audit log reads its tail, so this fails if the store is
    /// unavailable.
    pub fn new(config: &ServerConfig, store: Arc<dyn RecordStore>) -> StoreResult<Self> {
        let keys = Arc::new(KeyStore::new(store.clone()));
        let audit = Arc::new(AuditLog::open(store)?);
        info!("audit log opened with {} entries", audit.len());

        let validator = Validator::new(keys.clone(), audit.clone())
            .with_store_timeout(config.store_timeout());
        let callers = CredentialAuthenticator::from_config(&config.callers);
        if callers.is_empty() {
            warn!("no callers configured, every verify request will be rejected");
        }
        let endpoint = VerificationEndpoint::new(validator, Arc::new(callers))
            .with_max_batch_size(config.max_batch_size);

        let admin = config.admin_key.as_deref().map(AdminKey::new);
        if admin.is_none() {
            warn!("no admin key configured, license management routes are disabled");
        }

        Ok(Self {
            endpoint,
            issuer: LicenseIssuer::new(keys, audit),
            admin,
        })
    }

    pub(crate) fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let authorized = match (&self.admin, Credentials::from_headers(headers)) {
            (Some(admin), Some(credentials)) => admin.matches(&credentials),
            _ => false,
        };
        if authorized {
            Ok(())
        } else {
            warn!("rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Build the HTTP API router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health))
        .route(VERIFY_PATH, post(routes::verify))
        .route(
            LICENSES_PATH,
            post(routes::issue_license).get(routes::list_licenses),
        )
        .route(&format!("{LICENSES_PATH}/{{key}}"), get(routes::get_license))
        .route(
            &format!("{LICENSES_PATH}/{{key}}/revoke"),
            post(routes::revoke_license),
        )
        .route(
            &format!("{LICENSES_PATH}/{{key}}/usage"),
            get(routes::license_usage),
        )
        .with_state(state)
}
