//! Error types for resource requests.

use thiserror::Error;

/// A fetch, create, update or delete call failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    /// The request could not be sent or no response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{method} {target} failed with status {status}: {body}")]
    Status {
        method: &'static str,
        target: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected record shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The HTTP client could not be built from the configuration.
    #[error("invalid client configuration: {0}")]
    Client(String),
}

impl RequestError {
    /// Returns a user-friendly error message suitable for display.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => "Could not reach the server. Please check your connection.",
            Self::Status { status: 401 | 403, .. } => "You are not allowed to perform this action.",
            Self::Status { status: 404, .. } => "The item no longer exists on the server.",
            Self::Status { .. } => "The server rejected the request.",
            Self::Decode(_) | Self::Client(_) => "An unexpected error occurred.",
        }
    }

    /// Whether repeating the same action may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::Client(_) => false,
        }
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for resource requests.
pub type Result<T> = std::result::Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> RequestError {
        RequestError::Status {
            method: "PATCH",
            target: "/api/option/1".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable() {
        assert!(RequestError::Network("timeout".to_string()).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!RequestError::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_user_messages() {
        assert!(status(404).user_message().contains("no longer exists"));
        assert!(status(401).user_message().contains("not allowed"));
        assert_eq!(status(500).status(), Some(500));
    }
}
