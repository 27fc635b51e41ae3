//! One poll iteration: fetch → freshness → dedup → notify.

use crate::dedup::DedupTracker;
use crate::freshness::{keep_fresh, DEFAULT_MAX_AGE};
use crate::sink::{MessageFormatter, NotificationSink};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use trending_core::{Clock, TrendingToken};
use trending_feeds::FetchCoordinator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("A check is already running")]
    AlreadyRunning,
}

/// Where the cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CyclePhase {
    #[default]
    Idle = 0,
    Fetching = 1,
    Filtering = 2,
    Notifying = 3,
    Scheduled = 4,
}

impl CyclePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CyclePhase::Fetching,
            2 => CyclePhase::Filtering,
            3 => CyclePhase::Notifying,
            4 => CyclePhase::Scheduled,
            _ => CyclePhase::Idle,
        }
    }

    /// True while a cycle holds the single-flight guard.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            CyclePhase::Fetching | CyclePhase::Filtering | CyclePhase::Notifying
        )
    }
}

/// Tunables for a cycle.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Freshness window.
    pub max_age: Duration,
    /// Pause between two consecutive notifications.
    pub message_delay: Duration,
    /// Wait before the single retry of a rate-limited message.
    pub rate_limit_backoff: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            message_delay: Duration::from_millis(500),
            rate_limit_backoff: Duration::from_secs(3),
        }
    }
}

struct PhaseReset<'a>(&'a AtomicU8);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0.store(CyclePhase::Idle as u8, Ordering::SeqCst);
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Adapter that answered, `None` when every source was exhausted
    pub source: Option<String>,
    pub fetched: usize,
    pub fresh: usize,
    /// Newly seen tokens, in source order
    pub notified: Vec<TrendingToken>,
    pub delivered: usize,
    pub failed: usize,
}

/// The orchestrator.
///
/// At most one cycle executes at a time. Timer-driven runs wait for the
/// guard, manual runs are rejected while another cycle is in flight, so
/// `is_known` / `mark_notified` are never interleaved across cycles.
pub struct CheckCycle {
    coordinator: FetchCoordinator,
    tracker: Arc<DedupTracker>,
    sink: Arc<dyn NotificationSink>,
    formatter: Arc<dyn MessageFormatter>,
    clock: Arc<dyn Clock>,
    config: CycleConfig,
    guard: Mutex<()>,
    phase: AtomicU8,
    /// Unix ms of the last fetch a source answered, 0 = never
    last_check_ms: AtomicI64,
    cycles_completed: AtomicU64,
    notifications_sent: AtomicU64,
}

impl CheckCycle {
    pub fn new(
        coordinator: FetchCoordinator,
        tracker: Arc<DedupTracker>,
        sink: Arc<dyn NotificationSink>,
        formatter: Arc<dyn MessageFormatter>,
        clock: Arc<dyn Clock>,
        config: CycleConfig,
    ) -> Self {
        Self {
            coordinator,
            tracker,
            sink,
            formatter,
            clock,
            config,
            guard: Mutex::new(()),
            phase: AtomicU8::new(CyclePhase::Idle as u8),
            last_check_ms: AtomicI64::new(0),
            cycles_completed: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
        }
    }

    pub fn tracker(&self) -> &Arc<DedupTracker> {
        &self.tracker
    }

    pub fn phase(&self) -> CyclePhase {
        CyclePhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn last_check_ms(&self) -> Option<i64> {
        match self.last_check_ms.load(Ordering::SeqCst) {
            0 => None,
            ms => Some(ms),
        }
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    /// Run a cycle, waiting for any in-flight one to finish first.
    pub async fn run(&self) -> CycleReport {
        let _guard = self.guard.lock().await;
        self.execute().await
    }

    /// Run a cycle now, or fail if one is already in flight.
    pub async fn try_run(&self) -> Result<CycleReport, CycleError> {
        let _guard = self
            .guard
            .try_lock()
            .map_err(|_| CycleError::AlreadyRunning)?;
        Ok(self.execute().await)
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    async fn execute(&self) -> CycleReport {
        // Back to Idle on every exit, including cancellation mid-await
        let _idle = PhaseReset(&self.phase);
        self.set_phase(CyclePhase::Fetching);
        let outcome = self.coordinator.fetch().await;
        if outcome.source.is_some() {
            self.last_check_ms
                .store(self.clock.now_ms(), Ordering::SeqCst);
        }
        let fetched = outcome.tokens.len();

        self.set_phase(CyclePhase::Filtering);
        let now_ms = self.clock.now_ms();
        let max_age_ms = i64::try_from(self.config.max_age.as_millis()).unwrap_or(i64::MAX);
        let fresh = keep_fresh(outcome.tokens, max_age_ms, now_ms);
        let fresh_count = fresh.len();

        let mut queued = Vec::new();
        for token in fresh {
            if self.tracker.is_known(&token.id) {
                continue;
            }
            self.tracker.mark_notified(&token.id, now_ms);
            queued.push(token);
        }
        debug!(
            fetched = fetched,
            fresh = fresh_count,
            new = queued.len(),
            "Filtered tokens"
        );

        self.set_phase(CyclePhase::Notifying);
        let (delivered, failed) = self.notify_all(&queued).await;

        self.set_phase(CyclePhase::Scheduled);
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        if !queued.is_empty() {
            info!(
                new = queued.len(),
                delivered = delivered,
                failed = failed,
                "Notified about new trending tokens"
            );
        }

        let report = CycleReport {
            source: outcome.source,
            fetched,
            fresh: fresh_count,
            notified: queued,
            delivered,
            failed,
        };
        report
    }

    async fn notify_all(&self, tokens: &[TrendingToken]) -> (usize, usize) {
        let mut delivered = 0;
        let mut failed = 0;

        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.message_delay).await;
            }
            let message = self.formatter.format_token(token);
            if self.deliver(token, &message).await {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        self.notifications_sent
            .fetch_add(delivered as u64, Ordering::Relaxed);
        (delivered, failed)
    }

    /// Emit one message. Rate-limited messages get exactly one retry after
    /// the fixed backoff; anything else is abandoned.
    async fn deliver(&self, token: &TrendingToken, message: &str) -> bool {
        let err = match self.sink.emit(message).await {
            Ok(()) => {
                info!(id = %token.id, name = %token.display_name, "Notification sent");
                return true;
            }
            Err(e) => e,
        };

        if !err.is_rate_limited() {
            error!(id = %token.id, error = %err, "Failed to send notification");
            return false;
        }

        warn!(
            id = %token.id,
            backoff = ?self.config.rate_limit_backoff,
            "Rate limited, retrying once"
        );
        tokio::time::sleep(self.config.rate_limit_backoff).await;

        match self.sink.emit(message).await {
            Ok(()) => {
                info!(id = %token.id, "Retry successful");
                true
            }
            Err(e) => {
                error!(id = %token.id, error = %e, "Retry failed");
                false
            }
        }
    }
}
