//! Client configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API (endpoints live under `/api`).
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for idempotent requests on transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Where the persisted session lives. `None` means the platform default.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `CLAUSEWISE_API_URL` | API base URL |
    /// | `CLAUSEWISE_API_TIMEOUT` | Request timeout in seconds |
    /// | `CLAUSEWISE_API_MAX_RETRIES` | Retries for idempotent requests |
    /// | `CLAUSEWISE_SESSION_FILE` | Persisted session location |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("CLAUSEWISE_API_URL").unwrap_or_else(|_| default_api_url()),
            timeout_secs: std::env::var("CLAUSEWISE_API_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("CLAUSEWISE_API_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
            session_file: std::env::var_os("CLAUSEWISE_SESSION_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry budget for idempotent requests.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the persisted session location.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Validated base URL without a trailing slash.
    pub fn base_url(&self) -> ClientResult<String> {
        let parsed = Url::parse(&self.url).map_err(|e| ClientError::Config {
            message: format!("invalid API URL '{}': {}", self.url, e),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config {
                message: format!("unsupported URL scheme '{}'", parsed.scheme()),
            });
        }

        Ok(self.url.trim_end_matches('/').to_string())
    }
}
