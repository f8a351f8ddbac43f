//! Background refresh loop.
//!
//! # States
//! ```text
//! Idle ──timer tick──────────────▶ Running ──cycle done──▶ Idle
//! Idle ──force_refresh()──▶ Pending ──loop picks up──▶ Running
//! Pending / Running: force_refresh() answers "already in progress"
//! ```
//!
//! # Design Decisions
//! - The accept/reject decision is a single compare-and-swap on the phase
//! - Cycles run inline in the loop, so two cycles can never overlap
//! - A failed cycle leaves the published list untouched

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::config::validation::MAX_UPDATE_INTERVAL;
use crate::config::AppConfig;
use crate::feed::{FeedResult, InstanceSource};
use crate::health::Prober;
use crate::load_balancer::RoutingState;
use crate::observability::metrics;
use crate::ranking::{CandidateList, Judge};

/// Timer period for an interval in minutes, clamped to `1..=MAX_UPDATE_INTERVAL`.
fn tick_period(minutes: u64) -> Duration {
    let minutes = minutes.clamp(1, MAX_UPDATE_INTERVAL);
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Scheduler phase.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle = 0,
    /// A forced refresh was accepted and is waiting for the loop.
    Pending = 1,
    Running = 2,
}

impl From<u8> for Phase {
    fn from(val: u8) -> Self {
        match val {
            1 => Phase::Pending,
            2 => Phase::Running,
            _ => Phase::Idle,
        }
    }
}

/// Answer to a force-refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshStatus {
    #[serde(rename = "started")]
    Started,
    #[serde(rename = "already in progress")]
    AlreadyInProgress,
    /// The refresh loop has shut down.
    #[serde(rename = "stopped")]
    Stopped,
}

impl RefreshStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshStatus::Started => "started",
            RefreshStatus::AlreadyInProgress => "already in progress",
            RefreshStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloneable handle for requesting refreshes from outside the loop.
#[derive(Clone)]
pub struct RefreshHandle {
    phase: Arc<AtomicU8>,
    trigger: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Request an immediate refresh. Never waits on a running cycle.
    pub fn force_refresh(&self) -> RefreshStatus {
        if self
            .phase
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Pending as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return RefreshStatus::AlreadyInProgress;
        }

        // Capacity 1 and the Pending phase keep at most one signal queued,
        // so this can only fail once the loop is gone.
        match self.trigger.try_send(()) {
            Ok(()) => RefreshStatus::Started,
            Err(_) => {
                self.phase.store(Phase::Idle as u8, Ordering::Release);
                tracing::warn!("Refresh requested after the scheduler stopped");
                RefreshStatus::Stopped
            }
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from(self.phase.load(Ordering::Acquire))
    }
}

/// Periodically rebuilds the candidate list and publishes it.
pub struct RefreshScheduler {
    config: Arc<ArcSwap<AppConfig>>,
    state: Arc<RoutingState>,
    source: Arc<dyn InstanceSource>,
    prober: Arc<dyn Prober>,
    phase: Arc<AtomicU8>,
    trigger: mpsc::Receiver<()>,
}

impl RefreshScheduler {
    /// Create the scheduler and seed `state` with the default instance so
    /// the redirector has a target before the first cycle finishes.
    pub fn new(
        config: Arc<ArcSwap<AppConfig>>,
        state: Arc<RoutingState>,
        source: Arc<dyn InstanceSource>,
        prober: Arc<dyn Prober>,
    ) -> (Self, RefreshHandle) {
        let mut seed = CandidateList::fallback(&config.load().default_instance);
        seed.rotate_current();
        state.publish(seed);

        let phase = Arc::new(AtomicU8::new(Phase::Idle as u8));
        let (tx, rx) = mpsc::channel(1);

        let handle = RefreshHandle {
            phase: phase.clone(),
            trigger: tx,
        };
        let scheduler = Self {
            config,
            state,
            source,
            prober,
            phase,
            trigger: rx,
        };
        (scheduler, handle)
    }

    /// Run until shutdown. The first cycle starts immediately.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let minutes = self.config.load().updater.update_interval;
        let mut ticker = time::interval(tick_period(minutes));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_minutes = minutes, "Refresh scheduler starting");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.begin(Phase::Idle) {
                        tracing::debug!("Forced refresh pending, skipping timer tick");
                        continue;
                    }
                    self.cycle("timer").await;
                }
                signal = self.trigger.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    if self.begin(Phase::Pending) {
                        self.cycle("forced").await;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Refresh scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn begin(&self, from: Phase) -> bool {
        self.phase
            .compare_exchange(
                from as u8,
                Phase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    async fn cycle(&self, reason: &'static str) {
        let started = Instant::now();
        tracing::info!(reason, "Refreshing instance list");

        match self.refresh_once().await {
            Ok(count) => {
                tracing::info!(
                    candidates = count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Instance list updated"
                );
                metrics::record_refresh("ok", started);
            }
            Err(e) => {
                tracing::error!(error = %e, "Refresh failed, keeping current instance list");
                metrics::record_refresh("error", started);
            }
        }

        self.phase.store(Phase::Idle as u8, Ordering::Release);
    }

    /// One ingest → rank → publish pass with the current configuration.
    /// Returns the number of published candidates.
    pub async fn refresh_once(&self) -> FeedResult<usize> {
        let config = self.config.load_full();

        let instances = self.source.fetch(&config.updater).await?;
        metrics::record_instances_ingested(instances.len());

        let judge = Judge::new(&config.updater.advanced, self.prober.clone());
        let mut ranked = judge.rank(&instances).await;
        if ranked.is_empty() {
            tracing::warn!(
                default_instance = %config.default_instance,
                "No instance survived ranking, falling back to default"
            );
            ranked = CandidateList::fallback(&config.default_instance);
        }

        let count = ranked.len();
        metrics::record_candidates(count);
        self.state.publish(ranked);
        Ok(count)
    }
}
