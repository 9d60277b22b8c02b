//! Shared test helpers for server tests.

#![allow(dead_code)]

use licensy_server::{build_router, AppState, CallerConfig, CallerCredential, ServerConfig};
use licensy_storage::{mock::FlakyRecordStore, MemoryRecordStore, RecordStore};
use licensy_types::LicenseKey;
use serde_json::Value;
use std::sync::Arc;

pub const ADMIN_KEY: &str = "admin-secret";
pub const CALLER_TOKEN: &str = "billing-token";
pub const CALLER_NAME: &str = "billing";
pub const BASIC_USER: &str = "desktop-app";
pub const BASIC_PASSWORD: &str = "desktop-pass";
pub const BASIC_CALLER_NAME: &str = "desktop";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        admin_key: Some(ADMIN_KEY.to_string()),
        max_batch_size: 10,
        store_timeout_ms: 1000,
        callers: vec![
            CallerConfig {
                name: CALLER_NAME.to_string(),
                credential: CallerCredential::Bearer {
                    token: CALLER_TOKEN.to_string(),
                },
            },
            CallerConfig {
                name: BASIC_CALLER_NAME.to_string(),
                credential: CallerCredential::Basic {
                    username: BASIC_USER.to_string(),
                    password: BASIC_PASSWORD.to_string(),
                },
            },
        ],
        ..ServerConfig::default()
    }
}

/// A running server over a fault-injecting in-memory store.
pub struct TestServer {
    pub base: String,
    pub state: AppState,
    pub store: Arc<FlakyRecordStore<MemoryRecordStore>>,
    pub http: reqwest::Client,
}

/// Spin up the HTTP server on an OS-assigned port.
pub async fn spawn_test_server() -> TestServer {
    spawn_with_config(test_config()).await
}

pub async fn spawn_with_config(config: ServerConfig) -> TestServer {
    let store = Arc::new(FlakyRecordStore::new(MemoryRecordStore::new()));
    let shared: Arc<dyn RecordStore> = store.clone();
    let state = AppState::new(&config, shared).unwrap();
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        state,
        store,
        http: reqwest::Client::new(),
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Issues an active license directly through the issuer.
    pub fn active(&self, key: &str) -> LicenseKey {
        self.state
            .issuer
            .issue(&"acct-1".into(), Some(key))
            .unwrap();
        LicenseKey::from(key)
    }

    pub fn revoked(&self, key: &str) -> LicenseKey {
        let key = self.active(key);
        self.state.issuer.revoke(&key).unwrap();
        key
    }

    /// Number of audit entries recorded for `key`.
    pub fn audit_count(&self, key: &str) -> usize {
        self.state
            .issuer
            .usage(
                &LicenseKey::from(key),
                chrono::DateTime::<chrono::Utc>::MIN_UTC,
                chrono::DateTime::<chrono::Utc>::MAX_UTC,
            )
            .unwrap()
            .len()
    }

    /// Posts `body` to the verify endpoint with the caller's bearer token.
    pub async fn verify(&self, body: Value) -> reqwest::Response {
        self.http
            .post(self.url("/api/v1/verify"))
            .bearer_auth(CALLER_TOKEN)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub fn admin_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(ADMIN_KEY)
    }

    pub fn admin_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(ADMIN_KEY)
    }
}
