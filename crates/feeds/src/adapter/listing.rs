use async_trait::async_trait;
use serde_json::Value;
use trending_core::TrendingToken;

use super::{get_json, SourceAdapter};
use crate::alias::LISTING_FIELDS;
use crate::FeedError;

/// Adapter for pump.fun style listing endpoints.
///
/// The payload may be a bare list, `{"coins": [...]}` or `{"data": [...]}`.
pub struct ListingAdapter {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl ListingAdapter {
    pub const PUMP_FUN_TRENDING_URL: &'static str = "https://frontend-api.pump.fun/coins/trending";
    pub const PUMP_FUN_MIRROR_URL: &'static str =
        "https://client-api-2-74b1891ee9f9.herokuapp.com/coins?sort=trending";
    const COIN_PAGE_URL: &'static str = "https://pump.fun/coin";

    pub fn new(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }

    fn records(raw: &Value) -> Result<&Vec<Value>, FeedError> {
        if let Some(list) = raw.as_array() {
            return Ok(list);
        }
        ["coins", "data"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(Value::as_array))
            .ok_or_else(|| {
                FeedError::MalformedResponse("expected a list, {coins: [...]} or {data: [...]}".into())
            })
    }
}

#[async_trait]
impl SourceAdapter for ListingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_raw(&self) -> Result<Value, FeedError> {
        get_json(&self.client, &self.url).await
    }

    fn normalize(&self, raw: Value, now_ms: i64) -> Result<Vec<TrendingToken>, FeedError> {
        let tokens = Self::records(&raw)?
            .iter()
            .filter_map(|record| LISTING_FIELDS.to_token(record, now_ms))
            .map(|token| {
                let url = format!("{}/{}", Self::COIN_PAGE_URL, token.id);
                token.with_source_url(url)
            })
            .collect();
        Ok(tokens)
    }
}
