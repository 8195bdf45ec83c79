use std::time::Duration;

use crate::security::SecureString;

/// Configuration for connecting to a VSM API endpoint.
#[derive(Debug, Clone)]
pub struct VsmConfig {
    endpoint: String,
    auth_token: SecureString,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
    max_retry_delay: Duration,
    user_agent: String,
}

impl VsmConfig {
    /// Create a new VsmConfig for the given endpoint and pre-issued auth token.
    ///
    /// `endpoint` is the versioned API root, e.g. `http://controller:8778/v1/<tenant>`.
    /// A trailing slash is ignored.
    pub fn new(endpoint: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth_token: SecureString::new(auth_token.into()),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
            user_agent: format!("vsm-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retry attempts for list requests.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff between retries.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the longest single wait between retries, including any
    /// `Retry-After` the server asks for.
    pub fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    /// Set the `User-Agent` header sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Get the API endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the auth token.
    ///
    /// # Security
    /// Returns a reference to the secure string. Use `expose()` to access
    /// the underlying value. Avoid storing or logging the exposed value.
    pub fn auth_token(&self) -> &SecureString {
        &self.auth_token
    }

    /// Get the HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the maximum number of retry attempts.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the base backoff delay.
    pub fn retry_base_delay(&self) -> Duration {
        self.retry_base_delay
    }

    /// Get the ceiling for a single retry wait.
    pub fn max_retry_delay(&self) -> Duration {
        self.max_retry_delay
    }

    /// Get the user agent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
