//! Error types for the chat pipeline.

use thiserror::Error;

/// Errors that can occur while configuring the client or resolving a query.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never produced a readable response.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The classifier answered with an `error` field.
    #[error("{0}")]
    Remote(String),

    /// Non-success status without an error message in the body.
    #[error("Something went wrong (HTTP {0})")]
    Status(u16),

    /// Success status but the body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Formatter pattern failed to compile.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChatError {
    /// Whether the error came back from the classifier itself rather than the transport.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_displays_verbatim() {
        let err = ChatError::Remote("invalid request".to_string());
        assert_eq!(err.to_string(), "invalid request");
        assert!(err.is_remote());
    }

    #[test]
    fn test_status_error_display() {
        let err = ChatError::Status(502);
        assert_eq!(err.to_string(), "Something went wrong (HTTP 502)");
        assert!(!err.is_remote());
    }
}
