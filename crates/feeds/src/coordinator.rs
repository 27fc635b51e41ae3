//! Ordered multi-source fetching.
//!
//! Adapters are tried in priority order; the first one that answers with a
//! non-empty normalized list wins. Failures never leave this module.

use crate::adapter::SourceAdapter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trending_core::{Clock, TrendingToken};

/// Result of one coordinated fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Name of the adapter that produced `tokens`, `None` if all were exhausted
    pub source: Option<String>,
    pub tokens: Vec<TrendingToken>,
}

impl FetchOutcome {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Tries each adapter in turn until one yields tokens.
pub struct FetchCoordinator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    clock: Arc<dyn Clock>,
}

impl FetchCoordinator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, clock: Arc<dyn Clock>) -> Self {
        Self { adapters, clock }
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Fetch from the first healthy source. An empty outcome means
    /// "no data this cycle", not an error.
    pub async fn fetch(&self) -> FetchOutcome {
        for adapter in &self.adapters {
            let name = adapter.name();
            debug!(source = name, "Trying source");

            let raw = match adapter.fetch_raw().await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(source = name, transient = e.is_transient(), "Source unavailable: {}", e);
                    continue;
                }
            };

            let tokens = match adapter.normalize(raw, self.clock.now_ms()) {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!(source = name, "Could not normalize response: {}", e);
                    continue;
                }
            };

            if tokens.is_empty() {
                debug!(source = name, "Source returned no usable tokens");
                continue;
            }

            info!(source = name, count = tokens.len(), "Fetched trending tokens");
            return FetchOutcome {
                source: Some(name.to_string()),
                tokens,
            };
        }

        warn!(sources = self.adapters.len(), "All sources exhausted");
        FetchOutcome::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeedError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trending_core::ManualClock;

    const NOW: i64 = 1_700_000_000_000;

    enum Behavior {
        Fail,
        Malformed,
        Tokens(Vec<&'static str>),
    }

    struct MockAdapter {
        name: &'static str,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockAdapter {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceAdapter for MockAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_raw(&self) -> Result<Value, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Fail => Err(FeedError::Timeout("10s".into())),
                Behavior::Malformed => Ok(json!({ "unexpected": true })),
                Behavior::Tokens(ids) => Ok(json!(ids)),
            }
        }

        fn normalize(&self, raw: Value, now_ms: i64) -> Result<Vec<TrendingToken>, FeedError> {
            let list = raw
                .as_array()
                .ok_or_else(|| FeedError::MalformedResponse("not a list".into()))?;
            Ok(list
                .iter()
                .filter_map(Value::as_str)
                .map(|id| TrendingToken::new(id, now_ms))
                .collect())
        }
    }

    fn coordinator(adapters: Vec<Arc<dyn SourceAdapter>>) -> FetchCoordinator {
        FetchCoordinator::new(adapters, Arc::new(ManualClock::new(NOW)))
    }

    #[tokio::test]
    async fn test_fallback_ordering() {
        let a = MockAdapter::new("a", Behavior::Fail);
        let b = MockAdapter::new("b", Behavior::Tokens(vec!["B1", "B2"]));
        let c = MockAdapter::new("c", Behavior::Tokens(vec!["C1"]));

        let outcome = coordinator(vec![a.clone(), b.clone(), c.clone()]).fetch().await;

        let ids: Vec<&str> = outcome.tokens.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "B2"]);
        assert_eq!(outcome.source.as_deref(), Some("b"));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_and_empty_fall_through() {
        let a = MockAdapter::new("a", Behavior::Malformed);
        let b = MockAdapter::new("b", Behavior::Tokens(vec![]));
        let c = MockAdapter::new("c", Behavior::Tokens(vec!["C1"]));

        let outcome = coordinator(vec![a, b, c]).fetch().await;
        assert_eq!(outcome.source.as_deref(), Some("c"));
        assert_eq!(outcome.tokens.len(), 1);
        assert_eq!(outcome.tokens[0].created_at_ms, NOW);
    }

    #[tokio::test]
    async fn test_all_sources_exhausted_is_empty() {
        let a = MockAdapter::new("a", Behavior::Fail);
        let b = MockAdapter::new("b", Behavior::Malformed);

        let outcome = coordinator(vec![a, b]).fetch().await;
        assert!(outcome.is_empty());
        assert_eq!(outcome.source, None);
    }

    #[tokio::test]
    async fn test_no_adapters() {
        let outcome = coordinator(vec![]).fetch().await;
        assert!(outcome.is_empty());
    }
}
