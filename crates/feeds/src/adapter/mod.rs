//! Source adapter trait and implementations.
//!
//! Each upstream API has its own response shape.
//! Adapters normalize these into our internal [`TrendingToken`] format.

mod aggregator;
mod listing;

pub use aggregator::AggregatorAdapter;
pub use listing::ListingAdapter;

use crate::FeedError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use trending_core::TrendingToken;

/// Upper bound for a single upstream request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Trait for source-specific fetch + normalize units.
///
/// `fetch_raw` is the only side effect; `normalize` must be pure so it can
/// be tested against captured payloads.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Perform the HTTP request and decode the JSON body.
    async fn fetch_raw(&self) -> Result<Value, FeedError>;

    /// Convert a raw payload into canonical tokens, dropping records
    /// without an identifier.
    fn normalize(&self, raw: Value, now_ms: i64) -> Result<Vec<TrendingToken>, FeedError>;
}

/// Build the HTTP client shared by the adapters.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, FeedError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| FeedError::ConnectionFailed(e.to_string()))
}

/// GET `url` and decode the body as JSON. Non-2xx answers are errors.
pub(crate) async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value, FeedError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::HttpStatus(status.as_u16()));
    }

    Ok(response.json::<Value>().await?)
}

/// The production source list, in priority order.
pub fn default_adapters(timeout: Duration) -> Result<Vec<Arc<dyn SourceAdapter>>, FeedError> {
    let client = http_client(timeout)?;

    Ok(vec![
        Arc::new(ListingAdapter::new(
            "pump.fun",
            ListingAdapter::PUMP_FUN_TRENDING_URL,
            client.clone(),
        )),
        Arc::new(ListingAdapter::new(
            "pump.fun-mirror",
            ListingAdapter::PUMP_FUN_MIRROR_URL,
            client.clone(),
        )),
        Arc::new(AggregatorAdapter::dexscreener(client)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_adapters_order() {
        let adapters = default_adapters(DEFAULT_FETCH_TIMEOUT).unwrap();
        let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["pump.fun", "pump.fun-mirror", "dexscreener"]);
    }
}
