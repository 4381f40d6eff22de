//! Errors raised while locating and loading the client's local state.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// `$HOME` could not be resolved, so `~/.eventify` has no location
    #[error("Cannot locate the home directory for ~/.eventify")]
    NoHomeDirectory,

    /// The configured backend is not reachable over HTTP
    #[error("API base URL must use http or https, got {scheme}")]
    UnsupportedScheme { scheme: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// config.json could not be read or written
    #[error("Config file error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
