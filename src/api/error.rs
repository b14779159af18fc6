//! API error types

use thiserror::Error;

/// Errors surfaced by the HTTP client layer.
///
/// Variants hold rendered messages rather than source errors so results can
/// be shared across deduplicated callers.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Request never produced a response (offline, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(String),

    /// Backend rejected the request with a `{ detail }` payload.
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// Token renewal failed, or the retried request was rejected again.
    #[error("session expired, run 'discortize-cli login'")]
    SessionExpired,
}

impl ApiError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
            || matches!(self, ApiError::Api { status: 401, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Json(e.to_string())
    }
}
