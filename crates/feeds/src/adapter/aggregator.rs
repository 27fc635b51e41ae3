use async_trait::async_trait;
use serde_json::Value;
use trending_core::TrendingToken;
use url::Url;

use super::{get_json, SourceAdapter};
use crate::alias::{first_str, AGGREGATOR_FIELDS};
use crate::FeedError;

/// Adapter for cross-chain aggregators (DexScreener token boosts).
///
/// Aggregators list tokens from every chain, so records are kept only when
/// they sit on the target chain or link back to the launch platform.
pub struct AggregatorAdapter {
    name: String,
    url: String,
    client: reqwest::Client,
    chain_id: String,
    platform_domain: String,
}

impl AggregatorAdapter {
    pub const DEXSCREENER_BOOSTS_URL: &'static str = "https://api.dexscreener.com/token-boosts/top/v1";

    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        client: reqwest::Client,
        chain_id: impl Into<String>,
        platform_domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
            chain_id: chain_id.into(),
            platform_domain: platform_domain.into(),
        }
    }

    /// DexScreener top boosts filtered to Solana / pump.fun.
    pub fn dexscreener(client: reqwest::Client) -> Self {
        Self::new(
            "dexscreener",
            Self::DEXSCREENER_BOOSTS_URL,
            client,
            "solana",
            "pump.fun",
        )
    }

    fn references_platform(&self, link: &str) -> bool {
        match Url::parse(link) {
            Ok(url) => url.host_str().is_some_and(|host| {
                host == self.platform_domain
                    || host
                        .strip_suffix(self.platform_domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }),
            Err(_) => link.contains(self.platform_domain.as_str()),
        }
    }

    fn is_relevant(&self, record: &Value) -> bool {
        if record.get("chainId").and_then(Value::as_str) == Some(self.chain_id.as_str()) {
            return true;
        }
        if first_str(record, &["url"]).is_some_and(|link| self.references_platform(link)) {
            return true;
        }
        // Boost records also carry a `links` array of {type, label, url}
        record
            .get("links")
            .and_then(Value::as_array)
            .is_some_and(|links| {
                links
                    .iter()
                    .filter_map(|l| l.get("url").and_then(Value::as_str))
                    .any(|link| self.references_platform(link))
            })
    }
}

#[async_trait]
impl SourceAdapter for AggregatorAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_raw(&self) -> Result<Value, FeedError> {
        get_json(&self.client, &self.url).await
    }

    fn normalize(&self, raw: Value, now_ms: i64) -> Result<Vec<TrendingToken>, FeedError> {
        let records = raw
            .as_array()
            .ok_or_else(|| FeedError::MalformedResponse("expected a list of boosts".into()))?;

        Ok(records
            .iter()
            .filter(|record| self.is_relevant(record))
            .filter_map(|record| AGGREGATOR_FIELDS.to_token(record, now_ms))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn adapter() -> AggregatorAdapter {
        AggregatorAdapter::dexscreener(reqwest::Client::new())
    }

    #[test]
    fn test_keeps_target_chain_and_platform_links() {
        let raw = json!([
            { "chainId": "solana", "tokenAddress": "SOL1", "url": "https://dexscreener.com/solana/sol1" },
            { "chainId": "ethereum", "tokenAddress": "ETH1", "url": "https://dexscreener.com/ethereum/eth1" },
            { "chainId": "base", "tokenAddress": "PF1", "url": "https://pump.fun/coin/PF1" },
            { "chainId": "bsc", "tokenAddress": "LNK1", "links": [{ "type": "website", "url": "https://www.pump.fun/x" }] },
        ]);
        let tokens = adapter().normalize(raw, NOW).unwrap();
        let ids: Vec<&str> = tokens.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["SOL1", "PF1", "LNK1"]);
    }

    #[test]
    fn test_lookalike_domain_rejected() {
        let a = adapter();
        assert!(a.references_platform("https://pump.fun/coin/x"));
        assert!(a.references_platform("https://api.pump.fun/x"));
        assert!(!a.references_platform("https://notpump.fun/x"));
    }

    #[test]
    fn test_aggregator_fields() {
        let raw = json!([{
            "chainId": "solana",
            "tokenAddress": "SOL1",
            "tokenName": "Foo",
            "tokenSymbol": "FOO",
            "url": "https://dexscreener.com/solana/sol1",
        }]);
        let tokens = adapter().normalize(raw, NOW).unwrap();
        assert_eq!(tokens[0].display_name, "Foo");
        assert_eq!(tokens[0].symbol.as_deref(), Some("FOO"));
        assert_eq!(tokens[0].created_at_ms, NOW);
        assert_eq!(
            tokens[0].source_url.as_deref(),
            Some("https://dexscreener.com/solana/sol1")
        );
    }

    #[test]
    fn test_missing_address_dropped() {
        let raw = json!([{ "chainId": "solana", "tokenName": "No address" }]);
        assert!(adapter().normalize(raw, NOW).unwrap().is_empty());
    }

    #[test]
    fn test_object_payload_is_malformed() {
        let result = adapter().normalize(json!({ "data": [] }), NOW);
        assert!(matches!(result, Err(FeedError::MalformedResponse(_))));
    }
}
