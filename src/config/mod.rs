//! Configuration module for the Navigator client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Navigator API, including the `/api` prefix
    pub base_url: String,
    /// Per-request timeout; a request past this deadline counts as a network failure
    pub request_timeout: Duration,
    /// Fixed wait before the single automatic retry of a failed request
    pub retry_backoff: Duration,
    /// Optional file the auth token pair is persisted to between sessions
    pub token_path: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = env::var("NAVIGATOR_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());

        let request_timeout = env::var("NAVIGATOR_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(30_000));

        let retry_backoff = env::var("NAVIGATOR_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(2_000));

        let token_path = env::var("NAVIGATOR_TOKEN_PATH").ok().map(PathBuf::from);

        let log_level = env::var("NAVIGATOR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            base_url,
            request_timeout,
            retry_backoff,
            token_path,
            log_level,
        }
    }
}
