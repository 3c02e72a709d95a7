//! Dashboard client error types.

use finwatch_auth::AuthError;
use thiserror::Error;

/// Dashboard client error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failure from the gateway
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Non-success status from a resource endpoint
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rejected before sending
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Auth(e) => e.is_transient(),
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Auth(e) if e.requires_login())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
