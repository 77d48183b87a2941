use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(alias = "detail")]
    pub message: String,
}

/// Error body returned by the API, or synthesized locally when the body
/// could not be read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ApiError {}

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const BAD_REQUEST: &str = "BAD_REQUEST";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
pub const REQUEST_FAILED: &str = "REQUEST_FAILED";
pub const UNKNOWN: &str = "UNKNOWN";

impl ApiError {
    fn with_code(msg: impl Into<String>, code: &str) -> Self {
        Self {
            error: msg.into(),
            code: code.to_string(),
            details: None,
        }
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::with_code(msg, REQUEST_FAILED)
    }

    /// Builds an error from a bare HTTP status when the response body carries
    /// no usable `error`/`code` pair.
    pub fn from_status(status: u16, msg: impl Into<String>) -> Self {
        let code = match status {
            400 | 422 => BAD_REQUEST,
            404 => NOT_FOUND,
            500..=599 => INTERNAL_SERVER_ERROR,
            _ => UNKNOWN,
        };
        Self::with_code(msg, code)
    }
}

/// Django-style error body: `{"detail": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetailResponse {
    pub detail: String,
}
