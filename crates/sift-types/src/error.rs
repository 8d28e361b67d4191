//! Error types for Sift.

use thiserror::Error;

/// Errors from a single search call.
///
/// Transport errors (everything except `Framing` and `Decode`) always end
/// the call. `Framing` and `Decode` are only surfaced when the client runs
/// with [`ErrorPolicy::Fail`](crate::ErrorPolicy::Fail).
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response has no readable body")]
    EmptyBody,

    #[error("Request timeout")]
    Timeout,

    #[error("Malformed frame: {reason}")]
    Framing { reason: String },

    #[error("Could not decode '{event}' payload: {message}")]
    Decode { event: String, message: String },
}

impl ApiError {
    /// Returns `true` for per-frame errors that the error policy governs.
    pub fn is_local(&self) -> bool {
        matches!(self, ApiError::Framing { .. } | ApiError::Decode { .. })
    }
}

/// Errors from configuration loading and client construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("No credential configured: {hint}")]
    MissingCredential { hint: String },

    #[error("Both an access token and an OAuth token were configured; supply exactly one")]
    ConflictingCredentials,

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
