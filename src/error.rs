//! Error types for the dashboard clients
//!
//! Every failure coming back from the backend or from Alpha Vantage is an
//! `ApiError`. Callers that need a user-facing message branch on
//! `ApiError::kind()` instead of inspecting message text.

use reqwest::StatusCode;
use thiserror::Error;

/// Coarse classification used to pick user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    Other,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection refused, DNS failure, TLS errors and the like
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// Non-2xx response that is neither a rate limit nor a missing resource
    #[error("API error: {status} {reason}")]
    Status { status: u16, reason: String },

    /// HTTP 429, a provider rate-limit notice or the local request budget
    #[error("API rate limit reached: {0}")]
    RateLimited(String),

    /// HTTP 404 or a provider "no such symbol" answer
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    Decode(String),

    /// The request was understood but refused (mock broker rules)
    #[error("{0}")]
    Rejected(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("").to_string();
        match status {
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(reason),
            StatusCode::NOT_FOUND => ApiError::NotFound(reason),
            _ => ApiError::Status {
                status: status.as_u16(),
                reason,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::RateLimited(_) => ErrorKind::RateLimited,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status)
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Message shown in the search panel when a quote lookup fails
pub fn search_error_message(err: &ApiError, symbol: &str) -> String {
    match err.kind() {
        ErrorKind::RateLimited => "API rate limit reached. Please try again in a minute.".to_string(),
        ErrorKind::NotFound => {
            format!("Stock symbol \"{}\" not found. Please check and try again.", symbol)
        }
        ErrorKind::Other => format!("Failed to retrieve stock data: {}", err),
    }
}
