//! Error types for player identity resolution

use thiserror::Error;

/// Failure of a single id/name resolution.
///
/// Every waiter on a resolution handle receives its own copy, so this type is
/// `Clone` and carries rendered messages rather than source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The backend affirmatively reported that the player does not exist
    #[error("Player not found: {what}")]
    NotFound { what: String },

    /// Network or protocol failure (timeout, malformed response, connection loss)
    #[error("Failed to resolve {what}: {reason}")]
    TransportFailure { what: String, reason: String },
}

impl ResolveError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn transport(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TransportFailure {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether a later retry may succeed without anything changing upstream
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }
}

/// Errors raised by concrete resolution backends
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The profile API answered 429
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The profile API returned its structured error body
    #[error("Profile API error: {error}: {message}")]
    Api {
        error: String,
        message: String,
        cause: Option<String>,
    },

    /// Body was neither a profile nor an API error
    #[error("Invalid response (code {status}): `{body}`")]
    Malformed { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Connection closed")]
    Disconnected,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for resolutions
pub type LookupResult<T> = Result<T, ResolveError>;
