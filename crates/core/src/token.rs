//! Canonical token record shared by every source.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Placeholder used when a source does not provide a display name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Normalized token record produced by the source adapters.
///
/// Identity is the `id` (mint address) alone. Every other field is
/// presentation data and never participates in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingToken {
    /// Mint / contract address
    pub id: String,
    /// Human readable name
    pub display_name: String,
    /// Ticker (e.g., "BONK")
    pub symbol: Option<CompactString>,
    /// Market cap in USD, 0 when unknown
    pub market_cap_usd: f64,
    /// Creation time in Unix milliseconds
    pub created_at_ms: i64,
    /// Link back to the listing page
    pub source_url: Option<String>,
}

impl TrendingToken {
    /// Create a token with placeholder presentation fields.
    pub fn new(id: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            id: id.into(),
            display_name: UNKNOWN_NAME.to_string(),
            symbol: None,
            market_cap_usd: 0.0,
            created_at_ms,
            source_url: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the ticker symbol.
    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(CompactString::new(symbol));
        self
    }

    /// Set market cap; negative or non-finite values collapse to 0.
    pub fn with_market_cap(mut self, market_cap_usd: f64) -> Self {
        self.market_cap_usd = if market_cap_usd.is_finite() && market_cap_usd > 0.0 {
            market_cap_usd
        } else {
            0.0
        };
        self
    }

    /// Set the listing page link.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Age relative to `now_ms`. Missing creation time counts as age zero.
    #[inline]
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        if self.created_at_ms <= 0 {
            return 0;
        }
        now_ms - self.created_at_ms
    }
}

impl PartialEq for TrendingToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrendingToken {}

impl Hash for TrendingToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
