//! TTL-bounded record of already-notified tokens.

use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, info};

/// How long an id stays "already notified". Longer than the freshness
/// window so a token cannot age back into an alert while still trending.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Cadence of the background purge.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Map of token id -> first-notified time (Unix ms).
///
/// Entries are write-once; only [`DedupTracker::purge_expired`] removes
/// them. Purging is safe to run concurrently with lookups and inserts.
pub struct DedupTracker {
    entries: DashMap<String, i64>,
    ttl_ms: i64,
}

impl DedupTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Whether `id` already triggered a notification within the TTL.
    #[inline]
    pub fn is_known(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record `id` as notified at `now_ms`. An existing entry keeps its
    /// original timestamp.
    pub fn mark_notified(&self, id: &str, now_ms: i64) {
        self.entries.entry(id.to_string()).or_insert(now_ms);
        debug!(id = id, "Marked as notified");
    }

    /// First-notified time of `id`, if tracked.
    pub fn first_seen(&self, id: &str) -> Option<i64> {
        self.entries.get(id).map(|entry| *entry.value())
    }

    /// Drop every entry older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, first_seen| now_ms.saturating_sub(*first_seen) <= self.ttl_ms);
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            info!(
                removed = removed,
                tracked = self.entries.len(),
                "Purged expired dedup entries"
            );
        }
        removed
    }

    /// Number of tracked ids.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of tracked ids, for debugging.
    pub fn tracked_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for DedupTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_TTL)
    }
}
