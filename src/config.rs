//! Client configuration

use crate::error::{ClientError, Result};
use crate::token_store::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Base URL used when `SUPERTRY_API_URL` is not set
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";
/// Per-request timeout used when `SUPERTRY_HTTP_TIMEOUT_SECS` is not set
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_USER_AGENT: &str = concat!("supertry-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3000/api/v1` (no trailing slash)
    pub base_url: String,

    /// Timeout applied to every HTTP call, refresh included
    pub timeout: Duration,

    pub user_agent: String,

    /// JSON file holding persisted tokens. `None` keeps tokens in memory only.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token_file: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `SUPERTRY_API_URL`: API root
    /// - `SUPERTRY_HTTP_TIMEOUT_SECS`: request timeout in seconds
    /// - `SUPERTRY_TOKEN_FILE`: persist tokens to this JSON file
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("SUPERTRY_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = match std::env::var("SUPERTRY_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ClientError::Configuration(format!(
                        "SUPERTRY_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let token_file = std::env::var("SUPERTRY_TOKEN_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            base_url,
            timeout,
            token_file,
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Check the config and normalize the base URL
    pub fn validate(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ClientError::Configuration("base_url is required".into()));
        }
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ClientError::Configuration(format!(
                "base_url must start with http:// or https://, got {trimmed}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Configuration("timeout must be non-zero".into()));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    /// Durable token backend selected by this config
    pub fn token_storage(&self) -> Arc<dyn TokenStorage> {
        match &self.token_file {
            Some(path) => Arc::new(FileTokenStorage::new(path)),
            None => Arc::new(MemoryTokenStorage::new()),
        }
    }
}
