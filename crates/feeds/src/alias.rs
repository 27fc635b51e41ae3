//! Declarative field alias mapping.
//!
//! Upstream schemas disagree on field names (`name` vs `tokenName`,
//! `mint` vs `tokenAddress`, ...). Each canonical attribute lists the raw
//! names it may appear under, in priority order; the first non-empty value
//! wins.

use serde_json::Value;
use trending_core::TrendingToken;

/// Anything below this is treated as Unix seconds rather than milliseconds.
const SECONDS_CUTOFF: f64 = 1e11;

/// Ordered raw field names for each canonical attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub id: &'static [&'static str],
    pub name: &'static [&'static str],
    pub symbol: &'static [&'static str],
    pub market_cap: &'static [&'static str],
    pub created_at: &'static [&'static str],
    pub url: &'static [&'static str],
}

/// Field names used by pump.fun style listing APIs.
pub const LISTING_FIELDS: FieldAliases = FieldAliases {
    id: &["mint", "address", "id"],
    name: &["name", "tokenName"],
    symbol: &["symbol", "ticker", "tokenSymbol"],
    market_cap: &["marketCap", "usdMarketCap", "usd_market_cap", "market_cap"],
    created_at: &["createdTimestamp", "created_timestamp", "created_at", "created"],
    url: &[],
};

/// Field names used by DexScreener style aggregator APIs.
pub const AGGREGATOR_FIELDS: FieldAliases = FieldAliases {
    id: &["tokenAddress", "address"],
    name: &["tokenName", "name", "description"],
    symbol: &["tokenSymbol", "symbol"],
    market_cap: &["marketCap", "market_cap"],
    created_at: &["createdTimestamp", "pairCreatedAt"],
    url: &["url"],
};

impl FieldAliases {
    /// Build a token from a raw record. Returns `None` when no identifier
    /// alias carries a usable value.
    pub fn to_token(&self, record: &Value, now_ms: i64) -> Option<TrendingToken> {
        let id = first_id(record, self.id)?;
        let created_at_ms = first_timestamp_ms(record, self.created_at).unwrap_or(now_ms);

        let mut token = TrendingToken::new(id, created_at_ms)
            .with_market_cap(first_number(record, self.market_cap).unwrap_or(0.0));

        if let Some(name) = first_str(record, self.name) {
            token = token.with_name(name);
        }
        if let Some(symbol) = first_str(record, self.symbol) {
            token = token.with_symbol(symbol);
        }
        if let Some(url) = first_str(record, self.url) {
            token = token.with_source_url(url);
        }

        Some(token)
    }
}

/// First non-blank string among `aliases`.
pub fn first_str<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// First usable identifier among `aliases`. Integer ids are kept as
/// their decimal text.
pub fn first_id(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        })
}

/// First finite, non-zero number among `aliases`. Numeric strings count.
pub fn first_number(record: &Value, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|key| record.get(*key).and_then(as_f64))
        .find(|v| v.is_finite() && *v != 0.0)
}

/// First usable timestamp among `aliases`, in Unix milliseconds.
///
/// Accepts milliseconds, seconds (scaled up) and RFC 3339 strings.
pub fn first_timestamp_ms(record: &Value, aliases: &[&str]) -> Option<i64> {
    aliases
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| {
            if let Some(s) = value.as_str() {
                if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s.trim()) {
                    return Some(dt.timestamp_millis());
                }
            }
            let raw = as_f64(value)?;
            if !raw.is_finite() || raw <= 0.0 {
                return None;
            }
            let ms = if raw < SECONDS_CUTOFF { raw * 1000.0 } else { raw };
            Some(ms as i64)
        })
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_first_non_empty_alias_wins() {
        let record = json!({ "name": "", "tokenName": "Foo" });
        assert_eq!(first_str(&record, &["name", "tokenName"]), Some("Foo"));

        let record = json!({ "name": "Bar", "tokenName": "Foo" });
        assert_eq!(first_str(&record, &["name", "tokenName"]), Some("Bar"));
    }

    #[test]
    fn test_first_number_skips_zero_and_accepts_strings() {
        let record = json!({ "marketCap": 0, "usdMarketCap": "1234.5" });
        assert_eq!(
            first_number(&record, &["marketCap", "usdMarketCap"]),
            Some(1234.5)
        );
        assert_eq!(first_number(&json!({}), &["marketCap"]), None);
    }

    #[test]
    fn test_timestamp_forms() {
        let ms = json!({ "t": 1_700_000_000_123i64 });
        assert_eq!(first_timestamp_ms(&ms, &["t"]), Some(1_700_000_000_123));

        let secs = json!({ "t": 1_700_000_000 });
        assert_eq!(first_timestamp_ms(&secs, &["t"]), Some(1_700_000_000_000));

        let iso = json!({ "t": "2023-11-14T22:13:20Z" });
        assert_eq!(first_timestamp_ms(&iso, &["t"]), Some(1_700_000_000_000));

        let zero_then_valid = json!({ "a": 0, "b": 1_700_000_000_000i64 });
        assert_eq!(
            first_timestamp_ms(&zero_then_valid, &["a", "b"]),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn test_listing_record_to_token() {
        let record = json!({
            "mint": "X1",
            "tokenName": "Foo",
            "ticker": "FOO",
            "usd_market_cap": 52_000.0,
            "created_timestamp": NOW - 1_000,
        });
        let token = LISTING_FIELDS.to_token(&record, NOW).unwrap();
        assert_eq!(token.id, "X1");
        assert_eq!(token.display_name, "Foo");
        assert_eq!(token.symbol.as_deref(), Some("FOO"));
        assert_eq!(token.market_cap_usd, 52_000.0);
        assert_eq!(token.created_at_ms, NOW - 1_000);
    }

    #[test]
    fn test_missing_identifier_is_dropped() {
        let record = json!({
            "name": "Foo",
            "symbol": "FOO",
            "marketCap": 10.0,
            "createdTimestamp": NOW,
        });
        assert!(LISTING_FIELDS.to_token(&record, NOW).is_none());

        let blank = json!({ "mint": "   ", "name": "Foo" });
        assert!(LISTING_FIELDS.to_token(&blank, NOW).is_none());
    }

    #[test]
    fn test_numeric_identifier_is_kept() {
        let record = json!({ "id": 12345, "name": "Foo" });
        let token = LISTING_FIELDS.to_token(&record, NOW).unwrap();
        assert_eq!(token.id, "12345");

        // Blank string alias falls through to a numeric one
        let record = json!({ "mint": "  ", "id": 7 });
        assert_eq!(first_id(&record, LISTING_FIELDS.id), Some("7".to_string()));

        // Fractional and boolean values are not identifiers
        let record = json!({ "mint": 1.5, "id": true });
        assert!(LISTING_FIELDS.to_token(&record, NOW).is_none());
    }

    #[test]
    fn test_missing_created_defaults_to_now() {
        let record = json!({ "mint": "X1" });
        let token = LISTING_FIELDS.to_token(&record, NOW).unwrap();
        assert_eq!(token.created_at_ms, NOW);
        assert_eq!(token.display_name, trending_core::UNKNOWN_NAME);
    }
}
