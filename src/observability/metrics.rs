//! Metrics collection and exposition.
//!
//! # Metrics
//! - `selector_refresh_total` (counter): refresh cycles by outcome
//! - `selector_refresh_duration_seconds` (histogram): cycle duration
//! - `selector_instances_ingested` (gauge): instances that passed feed policy
//! - `selector_candidates` (gauge): size of the published candidate list
//! - `selector_probe_total` (counter): probes by tier and liveness
//! - `selector_redirects_total` (counter): redirects by kind (instance, bang)
//! - `selector_bang_cache_total` (counter): extraction cache hits and misses
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The exporter is opt-in through `observability.metrics_enabled`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_refresh(outcome: &'static str, started: Instant) {
    counter!("selector_refresh_total", "outcome" => outcome).increment(1);
    histogram!("selector_refresh_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_instances_ingested(count: usize) {
    gauge!("selector_instances_ingested").set(count as f64);
}

pub fn record_candidates(count: usize) {
    gauge!("selector_candidates").set(count as f64);
}

pub fn record_probe(tier: &'static str, alive: bool) {
    let alive = if alive { "true" } else { "false" };
    counter!("selector_probe_total", "tier" => tier, "alive" => alive).increment(1);
}

pub fn record_redirect(kind: &'static str) {
    counter!("selector_redirects_total", "kind" => kind).increment(1);
}

pub fn record_bang_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("selector_bang_cache_total", "result" => result).increment(1);
}
