//! Lifecycle around [`CheckCycle`]: the poll timer, the dedup purge timer,
//! and status reporting.

use crate::cycle::{CheckCycle, CycleError, CyclePhase, CycleReport};
use crate::dedup::DEFAULT_PURGE_INTERVAL;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trending_core::Clock;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Grace period for background tasks on stop before they are aborted.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    pub purge_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }
}

/// Point-in-time view of the monitor, served to `/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub uptime_ms: i64,
    pub tracked_count: usize,
    pub last_check_ms: Option<i64>,
    pub is_running: bool,
    pub phase: CyclePhase,
    pub cycles_completed: u64,
    pub notifications_sent: u64,
    pub poll_interval_ms: u64,
}

pub struct TrendingMonitor {
    cycle: Arc<CheckCycle>,
    clock: Arc<dyn Clock>,
    config: MonitorConfig,
    running: AtomicBool,
    started_at_ms: AtomicI64,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TrendingMonitor {
    pub fn new(cycle: Arc<CheckCycle>, clock: Arc<dyn Clock>, config: MonitorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            cycle,
            clock,
            config,
            running: AtomicBool::new(false),
            started_at_ms: AtomicI64::new(0),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn cycle(&self) -> &Arc<CheckCycle> {
        &self.cycle
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the poll and purge loops. The first check runs immediately.
    /// Returns `false` if the monitor was already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Monitor already running");
            return false;
        }
        self.started_at_ms
            .store(self.clock.now_ms(), Ordering::SeqCst);
        self.shutdown.send_replace(false);

        let poll = spawn_poll_loop(
            Arc::clone(&self.cycle),
            self.config.poll_interval,
            self.shutdown.subscribe(),
        );
        let purge = spawn_purge_loop(
            Arc::clone(&self.cycle),
            Arc::clone(&self.clock),
            self.config.purge_interval,
            self.shutdown.subscribe(),
        );

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(poll);
            tasks.push(purge);
        }

        info!(
            poll_interval = ?self.config.poll_interval,
            purge_interval = ?self.config.purge_interval,
            "Trending monitor started"
        );
        true
    }

    /// Signal both loops to exit and wait for them, aborting stragglers.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shutdown.send_replace(true);

        let handles: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for mut handle in handles {
            if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
                warn!("Background task did not stop in time, aborting");
                handle.abort();
                // Wait for the cancelled future to be dropped
                let _ = handle.await;
            }
        }
        info!("Trending monitor stopped");
    }

    /// Run a check now. Rejected while another cycle is in flight.
    pub async fn force_check(&self) -> Result<CycleReport, CycleError> {
        info!("Manual check requested");
        self.cycle.try_run().await
    }

    pub fn status(&self) -> StatusSnapshot {
        let is_running = self.is_running();
        let uptime_ms = if is_running {
            (self.clock.now_ms() - self.started_at_ms.load(Ordering::SeqCst)).max(0)
        } else {
            0
        };

        StatusSnapshot {
            uptime_ms,
            tracked_count: self.cycle.tracker().count(),
            last_check_ms: self.cycle.last_check_ms(),
            is_running,
            phase: self.cycle.phase(),
            cycles_completed: self.cycle.cycles_completed(),
            notifications_sent: self.cycle.notifications_sent(),
            poll_interval_ms: self.config.poll_interval.as_millis() as u64,
        }
    }
}

fn spawn_poll_loop(
    cycle: Arc<CheckCycle>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let report = cycle.run().await;
            debug!(
                source = ?report.source,
                notified = report.notified.len(),
                "Check cycle finished"
            );

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }
        debug!("Poll loop exited");
    })
}

fn spawn_purge_loop(
    cycle: Arc<CheckCycle>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle.tracker().purge_expired(clock.now_ms());
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("Purge loop exited");
    })
}
