//! Failures surfaced by the session gateway.
//!
//! Anything for which [`AuthError::requires_login`] is true means the local
//! session is gone and the caller should send the user back to `login`.

use crate::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// 400/401/403 from the login endpoint, carrying the backend's message.
    #[error("login rejected: {0}")]
    InvalidCredentials(String),

    /// The single refresh attempt failed or timed out. Only the task that
    /// ran the refresh sees this; queued requests get `SessionExpired`.
    #[error("could not refresh session: {0}")]
    TokenRefresh(String),

    /// Issued token has no readable `exp` claim.
    #[error("token has no usable expiry: {0}")]
    MalformedToken(String),

    #[error("no session on this device")]
    NotLoggedIn,

    #[error("session expired, log in again")]
    SessionExpired,

    /// Still 401 after one replay with a fresh token.
    #[error("backend rejected the refreshed session")]
    Unauthorized,

    #[error("{required} role needed, signed in as {actual}")]
    Forbidden { required: Role, actual: Role },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("refresh machine rejected input: {0}")]
    InvalidStateTransition(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad API url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AuthError {
    /// Worth retrying later: 5xx, connect failures and timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Status { status, .. } => *status >= 500,
            AuthError::Http(e) => {
                e.is_connect()
                    || e.is_timeout()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }

    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::NotLoggedIn
                | AuthError::SessionExpired
                | AuthError::Unauthorized
                | AuthError::TokenRefresh(_)
                | AuthError::MalformedToken(_)
        )
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
