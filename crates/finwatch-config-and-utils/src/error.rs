//! Errors raised while resolving settings and the local data directory.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting is present but unusable, e.g. a zero timeout.
    #[error("invalid setting: {0}")]
    Config(String),

    #[error("filesystem: {0}")]
    Io(#[from] std::io::Error),

    /// `api_url` did not parse.
    #[error("bad API url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// `config.json` exists but is not valid JSON for [`crate::Config`].
    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    /// No usable base directory (no home and no override).
    #[error("cannot resolve data directory: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
