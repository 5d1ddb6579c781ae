//! Server configuration assembled once at startup

use crate::error::ServerError;
use intake_shared::{DEFAULT_HOST, DEFAULT_PORT, SERVER_IDLE_WINDOW};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "admissions.db";
/// Longest a single connection may spend sending its request.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);
/// Longest shutdown waits for in-flight connections before aborting them.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the listener, authentication gate and store need to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret every request must carry in `auth_key`.
    pub auth_key: String,
    pub database: PathBuf,
    /// Quiet period that ends a request.
    pub idle_window: Duration,
    /// Upper bound on receiving one request, however the peer paces it.
    pub request_deadline: Duration,
    pub drain_timeout: Duration,
}

impl ServerConfig {
    /// Defaults for everything except the secret.
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auth_key: auth_key.into(),
            database: PathBuf::from(DEFAULT_DATABASE),
            idle_window: SERVER_IDLE_WINDOW,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.auth_key.trim().is_empty() {
            return Err(ServerError::Config("auth key must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ServerError::Config("host must not be empty".to_string()));
        }
        if self.idle_window.is_zero() {
            return Err(ServerError::Config(
                "idle window must be greater than zero".to_string(),
            ));
        }
        if self.request_deadline < self.idle_window {
            return Err(ServerError::Config(
                "request deadline must not be shorter than the idle window".to_string(),
            ));
        }
        Ok(())
    }
}
