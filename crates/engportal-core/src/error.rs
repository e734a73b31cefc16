//! Gateway error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of gateway failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection failure or timeout; the session is left untouched
    Unreachable,
    /// HTTP 401; any session the request carried has been torn down
    Unauthorized,
    /// Missing required input, caught before any request was sent
    Validation,
    /// Any other non-2xx response
    RemoteRejection,
    /// 2xx response whose body did not match the expected shape
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Unreachable => write!(f, "unreachable"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::RemoteRejection => write!(f, "remote_rejection"),
            ApiErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Structured error from the gateway with kind and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Optional raw response body
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unreachable, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    /// Builds the error for a 401 response.
    pub fn unauthorized(body: &str) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: server_message(body).unwrap_or_else(|| "Unauthorized".to_string()),
            status: Some(401),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Builds a rejection from a non-2xx response.
    ///
    /// Prefers the server's `message` (or `error`) field; falls back to a
    /// generic line naming the status.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::RemoteRejection,
            message: server_message(body)
                .unwrap_or_else(|| format!("Request failed with status {status}")),
            status: Some(status),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Classifies a reqwest error into an `ApiError`.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::unreachable(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::unreachable(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::decode(format!("Failed to parse response: {e}"))
        } else {
            Self::unreachable(format!("Network error: {e}"))
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

/// Extracts a non-blank `message` (or `error`) string from a JSON body.
fn server_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
