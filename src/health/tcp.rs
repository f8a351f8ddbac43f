//! TCP handshake prober.
//!
//! Each "echo" is one TCP connect to the instance's host and scheme port;
//! the handshake time stands in for the round trip. Probes are spaced by
//! `interval` and the whole run stops at `timeout`, so the intensive tier
//! may send fewer than `count` probes.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use url::Url;

use crate::health::probe::{LatencyProbeResult, ProbeSpec, Prober};

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpEchoProber;

impl TcpEchoProber {
    pub fn new() -> Self {
        Self
    }
}

impl Prober for TcpEchoProber {
    fn probe_host(&self, url: String, spec: ProbeSpec) -> BoxFuture<'static, LatencyProbeResult> {
        Box::pin(probe_url(url, spec))
    }
}

/// Resolve the host and port an instance URL is served from.
pub fn probe_target(url: &str) -> Option<(String, u16)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    let port = parsed.port_or_known_default()?;
    Some((host, port))
}

async fn probe_url(url: String, spec: ProbeSpec) -> LatencyProbeResult {
    let Some((host, port)) = probe_target(&url) else {
        tracing::warn!(url = %url, "Could not parse instance URL for probing");
        return LatencyProbeResult::unreachable(url);
    };

    let deadline = Instant::now() + spec.timeout;
    let mut sent = 0u32;
    let mut rtts = Vec::with_capacity(spec.count as usize);

    for i in 0..spec.count {
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        sent += 1;
        let started = Instant::now();
        match time::timeout_at(deadline, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_stream)) => rtts.push(started.elapsed()),
            Ok(Err(e)) => {
                tracing::debug!(host = %host, port, error = %e, "Probe connect failed");
            }
            Err(_) => {
                tracing::debug!(host = %host, port, "Probe timed out");
                break;
            }
        }

        if i + 1 < spec.count {
            time::sleep_until((started + spec.interval).min(deadline)).await;
        }
    }

    summarize(url, sent, &rtts)
}

fn summarize(url: String, sent: u32, rtts: &[Duration]) -> LatencyProbeResult {
    if sent == 0 || rtts.is_empty() {
        return LatencyProbeResult::unreachable(url);
    }

    let received = rtts.len() as u32;
    let total: Duration = rtts.iter().sum();
    LatencyProbeResult {
        url,
        is_alive: true,
        avg_rtt: total / received,
        packet_loss: 1.0 - f64::from(received) / f64::from(sent),
    }
}
