//! Error types for the session client.

use thiserror::Error;

/// Why a session refresh did not produce an identity.
///
/// Cloneable so every caller attached to the same in-flight refresh receives
/// the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-success status
    #[error("Session refresh rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// The identity fetch after a successful refresh failed
    #[error("Identity unavailable after refresh (HTTP {status})")]
    IdentityUnavailable { status: u16 },

    /// The identity payload did not decode
    #[error("Invalid identity payload: {0}")]
    InvalidIdentity(String),

    /// The request never produced a response
    #[error("Refresh transport failure: {0}")]
    Transport(String),

    /// The background refresh task panicked or was cancelled
    #[error("Refresh task aborted: {0}")]
    Aborted(String),
}

/// Error type for every API operation.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not reach the backend (transient, can retry)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Non-success response other than a recoverable 401
    #[error("Request failed with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request was rejected again after a successful refresh
    #[error("Unauthorized: session is no longer valid")]
    Unauthorized,

    /// The session could not be renewed; it has been cleared
    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// Operation requires a signed-in user
    #[error("Not logged in")]
    NotLoggedIn,

    /// OTP verification attempted without a preceding sign-in
    #[error("No sign-in is waiting for OTP verification")]
    MissingPendingOtp,

    /// Caller supplied something the backend would reject anyway
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid transition in a request or guard state machine
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] eventify_storage::StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] eventify_config_and_utils::CoreError),
}

impl ApiError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Network unavailable
    /// - HTTP errors with 5xx status codes
    /// - Connection timeouts
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::NetworkUnavailable(_) => true,
            ApiError::Timeout => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            ApiError::RefreshFailed(RefreshError::Transport(_)) => true,
            _ => false,
        }
    }

    /// Returns true if the session is gone and the user must sign in again.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::RefreshFailed(_))
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
