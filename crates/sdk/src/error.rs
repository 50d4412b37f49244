//! Error types for the Home Assistant client.

use hassbridge_core::CoreError;
use serde::{Deserialize, Serialize};

/// Result type for SDK operations.
pub type HassResult<T> = Result<T, HassError>;

/// Errors surfaced by the client. Nothing is retried; every failure reaches
/// the caller as exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum HassError {
    /// Token missing, invalid or lacking permission (401/403).
    #[error("Not authorized (status {status}): {message}")]
    NotAuthorized { status: u16, message: String },

    /// Entity, component or endpoint does not exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Home Assistant refused the request (any other non-2xx status).
    #[error("Home Assistant rejected the request (status {status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    /// Attribute not accepted by the control operation resolved for the entity.
    #[error("Attribute '{attribute}' is not supported by {operation}")]
    UnsupportedAttribute { attribute: String, operation: String },

    /// Connection refused, DNS failure or timeout.
    #[error("Home Assistant unreachable: {0}")]
    Unreachable(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arguments rejected before anything was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Stable, serializable name of an error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotAuthorized,
    NotFound,
    UpstreamRejected,
    UnsupportedAttribute,
    Unreachable,
    Config,
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotAuthorized => "not_authorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamRejected => "upstream_rejected",
            ErrorKind::UnsupportedAttribute => "unsupported_attribute",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::Config => "config",
            ErrorKind::InvalidInput => "invalid_input",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HassError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UpstreamRejected { .. } => ErrorKind::UpstreamRejected,
            Self::UnsupportedAttribute { .. } => ErrorKind::UnsupportedAttribute,
            Self::Unreachable(_) => ErrorKind::Unreachable,
            Self::Config(_) | Self::InvalidUrl(_) => ErrorKind::Config,
            Self::InvalidInput(_) | Self::Json(_) => ErrorKind::InvalidInput,
        }
    }

    /// Map a non-success status and its body to an error.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => response.message,
            Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
            Err(_) => body.trim().to_string(),
        };

        match status {
            401 | 403 => Self::NotAuthorized { status, message },
            404 => Self::NotFound(message),
            _ => Self::UpstreamRejected { status, message },
        }
    }
}

impl From<reqwest::Error> for HassError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::UpstreamRejected {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("undecodable response: {err}"),
            }
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl From<CoreError> for HassError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedAttribute {
                attribute,
                operation,
            } => Self::UnsupportedAttribute {
                attribute,
                operation,
            },
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// Error body returned by Home Assistant.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
