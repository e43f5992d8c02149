//! Error handling module for the Navigator client.
//!
//! Provides a centralized error type mapping HTTP outcomes to the failure
//! categories the resource stores surface to callers.

use serde::Deserialize;

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const IO_ERROR: &str = "IO_ERROR";
}

/// Client error type.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// No response received (connection failure or timeout); eligible for the
    /// single automatic retry
    Network(String),
    /// 401 from the server; the session has already been torn down
    Unauthorized(String),
    /// Client-side pre-send validation failure, or a non-401 4xx response
    Validation(String),
    /// 5xx response
    Server { status: u16, message: String },
    /// Response body failed to deserialize
    Decode(String),
    /// Local filesystem failure (token persistence, sitemap download)
    Io(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Network(_) => codes::NETWORK_ERROR,
            ApiError::Unauthorized(_) => codes::UNAUTHORIZED,
            ApiError::Validation(_) => codes::VALIDATION_ERROR,
            ApiError::Server { .. } => codes::SERVER_ERROR,
            ApiError::Decode(_) => codes::DECODE_ERROR,
            ApiError::Io(_) => codes::IO_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ApiError::Network(msg) => msg.clone(),
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Decode(msg) => msg.clone(),
            ApiError::Io(msg) => msg.clone(),
        }
    }

    /// Whether the HTTP client may retry the request that produced this error.
    /// Only network-level failures qualify; 401 is explicitly excluded.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::error!("Decode error: {:?}", err);
            return ApiError::Decode(format!("Failed to decode response: {}", err));
        }
        if err.is_timeout() {
            tracing::warn!("Request timed out: {:?}", err);
            return ApiError::Network("Request timed out".to_string());
        }
        match err.status() {
            Some(status) if status.as_u16() == 401 => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            Some(status) if status.is_server_error() => ApiError::Server {
                status: status.as_u16(),
                message: format!("Server error: {}", err),
            },
            Some(_) => ApiError::Validation(format!("Request failed: {}", err)),
            // No status at all means the request never produced a response
            None => {
                tracing::warn!("Network error: {:?}", err);
                ApiError::Network(format!("Network error: {}", err))
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("IO error: {:?}", err);
        ApiError::Io(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ApiError::Decode(format!("JSON error: {}", err))
    }
}

/// Error payload shape the API returns. The backend reports failures either as
/// `{"message": ...}` or `{"detail": ...}`; both are accepted.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// Extract the server-reported message from a raw error body, falling back
    /// to the body text itself when it is not JSON in the expected shape.
    pub fn extract_message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed
                .message
                .or(parsed.detail)
                .unwrap_or_else(|| body.to_string()),
            Err(_) => body.to_string(),
        }
    }
}
