//! Server configuration, read from a JSON file.
//!
//! ```json
//! {
//!   "port": 8080,
//!   "admin_key": "change-me",
//!   "database_path": "licensy.db",
//!   "callers": [
//!     { "name": "billing", "scheme": "bearer", "token": "..." },
//!     { "name": "desktop", "scheme": "basic", "username": "app", "password": "..." }
//!   ]
//! }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a configured caller proves its identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum CallerCredential {
    Bearer { token: String },
    Basic { username: String, password: String },
}

impl std::fmt::Debug for CallerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f.write_str("Bearer { .. }"),
            Self::Basic { username, .. } => write!(f, "Basic {{ username: {username:?}, .. }}"),
        }
    }
}

/// A service allowed to call the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerConfig {
    /// Identity recorded in the audit log for this caller's checks.
    pub name: String,
    #[serde(flatten)]
    pub credential: CallerCredential,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Key for the license management routes. Those routes reject every
    /// request when unset.
    pub admin_key: Option<String>,
    /// SQLite database file. An in-memory store is used when unset.
    pub database_path: Option<PathBuf>,
    /// Largest number of keys accepted in one verify request.
    pub max_batch_size: usize,
    /// Deadline for each key store or audit log access.
    pub store_timeout_ms: u64,
    pub callers: Vec<CallerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            admin_key: None,
            database_path: None,
            max_batch_size: 100,
            store_timeout_ms: 2000,
            callers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<redacted>"))
            .field("database_path", &self.database_path)
            .field("max_batch_size", &self.max_batch_size)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("callers", &self.callers)
            .finish()
    }
}

impl ServerConfig {
    /// Reads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.admin_key.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid("admin_key must not be empty".to_string()));
        }

        let mut usernames = HashSet::new();
        for caller in &self.callers {
            if caller.name.trim().is_empty() {
                return Err(ConfigError::Invalid("caller name must not be empty".to_string()));
            }
            match &caller.credential {
                CallerCredential::Bearer { token } if token.is_empty() => {
                    return Err(ConfigError::Invalid(format!(
                        "caller {} has an empty token",
                        caller.name
                    )));
                }
                CallerCredential::Basic { username, .. } if !usernames.insert(username) => {
                    return Err(ConfigError::Invalid(format!(
                        "username {username} is configured twice"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Address to bind the HTTP listener to.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
