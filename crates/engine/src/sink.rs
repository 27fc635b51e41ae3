//! Notification delivery seams.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use trending_core::TrendingToken;

/// Errors a notification sink can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl SinkError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SinkError::RateLimited { .. })
    }
}

/// Destination for formatted alert messages (the chat channel).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(&self, message: &str) -> Result<(), SinkError>;
}

/// Renders a token into display text. Missing fields render as
/// placeholders; formatting cannot fail.
pub trait MessageFormatter: Send + Sync {
    fn format_token(&self, token: &TrendingToken) -> String;
}
