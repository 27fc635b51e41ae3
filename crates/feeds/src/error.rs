//! Error types for feed operations.

use thiserror::Error;

/// Errors that can occur while fetching or normalizing a source.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else {
            FeedError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Returns true if the source is likely to answer on a later cycle
    /// (network trouble) rather than having changed its schema.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::ConnectionFailed(_) | FeedError::Timeout(_) => true,
            FeedError::HttpStatus(code) => *code == 429 || *code >= 500,
            FeedError::ParseError(_) | FeedError::MalformedResponse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FeedError::Timeout("10s".into()).is_transient());
        assert!(FeedError::ConnectionFailed("dns".into()).is_transient());
        assert!(FeedError::HttpStatus(503).is_transient());
        assert!(FeedError::HttpStatus(429).is_transient());
        assert!(!FeedError::HttpStatus(404).is_transient());
        assert!(!FeedError::MalformedResponse("object".into()).is_transient());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(FeedError::from(err), FeedError::ParseError(_)));
    }
}
