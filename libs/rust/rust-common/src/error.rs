//! Transport error types shared by provider and message collaborators.
//!
//! Anything that talks to a provider (an HTTP client, an in-process handler,
//! a mock) reports failures through [`PlatformError`]. The verification
//! engine classifies them into timeouts and unreachable providers.

use thiserror::Error;

/// Common error type for calls made on behalf of the verifier.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote side could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout occurred
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error means the call ran out of time.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// assert!(PlatformError::timeout("GET /users").is_timeout());
    /// assert!(!PlatformError::unavailable("connection refused").is_timeout());
    /// ```
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a timeout error with the given message.
    #[must_use]
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(PlatformError::timeout("slow").is_timeout());
        assert!(!PlatformError::unavailable("down").is_timeout());
        assert!(!PlatformError::invalid_input("bad verb").is_timeout());
        assert!(!PlatformError::internal("boom").is_timeout());
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::unavailable("connection refused");
        assert_eq!(err.to_string(), "Service unavailable: connection refused");

        let err = PlatformError::timeout("GET /users after 5s");
        assert_eq!(err.to_string(), "Operation timed out: GET /users after 5s");
    }

    #[test]
    fn test_serialization_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PlatformError = parse_err.into();
        assert!(matches!(err, PlatformError::Serialization(_)));
    }
}
