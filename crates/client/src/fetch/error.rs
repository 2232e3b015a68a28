//! Network error types.

use std::sync::Arc;

use haven_core::Error;

/// No response could be obtained for a request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Connection, DNS or TLS failure, or the client is offline.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Response body larger than the configured limit.
    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: usize, limit: usize },

    /// The request could not be sent as given.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport error not covered above.
    #[error("transport error: {0}")]
    Transport(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Unreachable(err.to_string())
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Transport(Arc::new(err))
        }
    }
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetworkError::TooLarge { size: 20, limit: 10 };
        assert_eq!(err.to_string(), "response too large: 20 bytes exceeds 10");

        let err: Error = NetworkError::Timeout.into();
        assert!(err.to_string().starts_with("NETWORK_ERROR"));
    }
}
