//! Error types for the horoscope proxy

use axum::http::StatusCode;
use thiserror::Error;

use crate::schema::SchemaIssue;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

pub const READING_UNAVAILABLE: &str = "We couldn't load today's reading. Try again.";
pub const REQUEST_FAILED: &str = "We couldn't process your request. Try again.";
pub const SCHEMA_CHANGED: &str = "API schema has changed. Please check back later.";
pub const NETWORK_UNAVAILABLE: &str = "Network error. Please check your connection and try again.";

#[derive(Error, Debug)]
pub enum ProxyError {

    // =============================
    // Boundary & Upstream Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Contract violation: {} schema issue(s)", .0.len())]
    ContractViolation(Vec<SchemaIssue>),

    /// The proxy itself answered with an `{error}` body (caller side).
    #[error("Proxy responded {status}: {message}")]
    Proxy { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Caller-visible error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NetworkError,
    UpstreamError,
    ContractViolation,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid-input",
            ErrorKind::NetworkError => "network-error",
            ErrorKind::UpstreamError => "upstream-error",
            ErrorKind::ContractViolation => "contract-violation",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProxyError::Network(_) => ErrorKind::NetworkError,
            ProxyError::Upstream { .. } | ProxyError::Proxy { .. } => ErrorKind::UpstreamError,
            ProxyError::ContractViolation(_) => ErrorKind::ContractViolation,
            ProxyError::HttpError(e) if e.is_connect() || e.is_timeout() => ErrorKind::NetworkError,
            _ => ErrorKind::Unexpected,
        }
    }

    /// HTTP status the proxy endpoint answers with for this error.
    ///
    /// Upstream statuses are echoed when they are valid error codes, anything
    /// else collapses to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProxyError::ContractViolation(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Upstream { status, .. } | ProxyError::Proxy { status, .. } => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, non-technical message safe to show an end user.
    ///
    /// `fallback` is used for every failure that is not client-correctable
    /// and not a contract violation. Raw upstream bodies never appear here.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ProxyError::InvalidInput(message) => message.clone(),
            ProxyError::ContractViolation(_) => SCHEMA_CHANGED.to_string(),
            ProxyError::Proxy { message, .. } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
