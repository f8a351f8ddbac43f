//! Concurrent liveness probing.
//!
//! # Responsibilities
//! - Define the two probe tiers (light and intensive)
//! - Fan out one task per host and collect results under a lock
//! - Join every task before returning
//!
//! # Design Decisions
//! - The transport sits behind the [`Prober`] trait so ranking can be tested
//!   without a network
//! - Fan-out is per call; no persistent worker pool

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, BoxFuture};
use parking_lot::Mutex;

use crate::observability::metrics;

/// Probe escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTier {
    /// 4 probes, 200 ms apart, 1 s overall timeout.
    Light,
    /// 8 probes, 2 s apart, 4 s overall timeout. Used only to re-check hosts
    /// that failed the light tier.
    Intensive,
}

impl ProbeTier {
    pub fn spec(self) -> ProbeSpec {
        match self {
            ProbeTier::Light => ProbeSpec {
                count: 4,
                interval: Duration::from_millis(200),
                timeout: Duration::from_secs(1),
            },
            ProbeTier::Intensive => ProbeSpec {
                count: 8,
                interval: Duration::from_secs(2),
                timeout: Duration::from_secs(4),
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeTier::Light => "light",
            ProbeTier::Intensive => "intensive",
        }
    }
}

impl fmt::Display for ProbeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probe count, spacing and overall deadline for one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSpec {
    pub count: u32,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Reachability of one host.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyProbeResult {
    /// The instance URL that was probed.
    pub url: String,
    pub is_alive: bool,
    /// Mean round trip of the successful probes.
    pub avg_rtt: Duration,
    /// Fraction of probes lost, 0.0..=1.0.
    pub packet_loss: f64,
}

impl LatencyProbeResult {
    /// Result for a host that could not be probed at all.
    pub fn unreachable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_alive: false,
            avg_rtt: Duration::ZERO,
            packet_loss: 1.0,
        }
    }
}

/// Transport used to probe a single host.
pub trait Prober: Send + Sync + 'static {
    /// Probe `url` according to `spec`. Must finish within `spec.timeout`
    /// (plus scheduling slack) and never panic on unreachable hosts.
    fn probe_host(&self, url: String, spec: ProbeSpec) -> BoxFuture<'static, LatencyProbeResult>;
}

/// Probe every URL concurrently and wait for all of them.
///
/// Result order is completion order, not input order.
pub async fn probe_all(
    prober: &Arc<dyn Prober>,
    urls: &[String],
    tier: ProbeTier,
) -> Vec<LatencyProbeResult> {
    let spec = tier.spec();
    let results = Arc::new(Mutex::new(Vec::with_capacity(urls.len())));

    let handles: Vec<_> = urls
        .iter()
        .map(|url| {
            let probe = prober.probe_host(url.clone(), spec);
            let results = results.clone();
            tokio::spawn(async move {
                let result = probe.await;
                results.lock().push(result);
            })
        })
        .collect();

    for joined in join_all(handles).await {
        if let Err(e) = joined {
            tracing::error!(tier = %tier, error = %e, "Probe task failed");
        }
    }

    let results = std::mem::take(&mut *results.lock());
    for result in &results {
        metrics::record_probe(tier.as_str(), result.is_alive);
    }

    tracing::debug!(
        tier = %tier,
        hosts = urls.len(),
        alive = results.iter().filter(|r| r.is_alive).count(),
        "Probe pass complete"
    );

    results
}
