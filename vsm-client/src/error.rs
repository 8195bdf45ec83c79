use thiserror::Error;

/// Errors that can occur when talking to the VSM API.
#[derive(Debug, Error)]
pub enum VsmError {
    /// A filter value could not be rendered into the query string.
    #[error("Cannot encode filter `{key}`: {message}")]
    Encoding { key: String, message: String },

    /// Client configuration is unusable (bad endpoint, HTTP client setup).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network error (connection failed, timeout, etc.).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The service rejected the request as malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Authentication failed (missing, invalid or expired token).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The token is valid but not allowed to perform the operation.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The resource does not exist, or no listed resource matched.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// More than one listed resource matched a `find` lookup.
    #[error("No unique match: {message}")]
    NoUniqueMatch { message: String },

    /// Rate limited by the server.
    #[error("Rate limited. Retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Server returned an error.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The response body did not carry the expected envelope key.
    #[error("Response is missing the `{key}` envelope")]
    MissingEnvelope { key: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl VsmError {
    /// Returns true if this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            VsmError::Network { .. } => true,
            VsmError::RateLimited { .. } => true,
            VsmError::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the suggested retry delay in seconds, if available.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            VsmError::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Result type for VSM client operations.
pub type VsmResult<T> = std::result::Result<T, VsmError>;
