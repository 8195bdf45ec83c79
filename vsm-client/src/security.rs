//! Credential handling for the VSM client.

use zeroize::ZeroizeOnDrop;

/// A secure string that automatically clears its contents when dropped.
///
/// Used for the auth token so it never shows up in `Debug` output or logs.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when no credential was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
