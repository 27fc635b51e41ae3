//! Freshness filter.

use std::time::Duration;
use trending_core::TrendingToken;

/// Tokens older than this are not worth an alert.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3 * 60 * 60);

/// Keep tokens created less than `max_age_ms` before `now_ms`, in order.
///
/// A missing creation time counts as age zero, so ambiguous records are
/// notified rather than silently dropped.
pub fn keep_fresh(tokens: Vec<TrendingToken>, max_age_ms: i64, now_ms: i64) -> Vec<TrendingToken> {
    tokens
        .into_iter()
        .filter(|token| token.age_ms(now_ms) < max_age_ms)
        .collect()
}
