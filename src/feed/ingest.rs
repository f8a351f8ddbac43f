//! Health feed ingestion.
//!
//! The feed's `instances` object is keyed by instance URL, so entries are
//! visited one by one instead of deserialized into a fixed structure.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;
use url::Url;

use crate::config::UpdaterConfig;
use crate::feed::policy::{EntryReport, FeedPolicy, Rejection};
use crate::feed::{FeedError, FeedResult};
use crate::ranking::instance::{missing_if_unset, Instance, InstanceSet, Timings};

const USER_AGENT: &str = concat!("instance-selector/", env!("CARGO_PKG_VERSION"));

/// Where a refresh cycle gets its instances from.
pub trait InstanceSource: Send + Sync + 'static {
    fn fetch<'a>(&'a self, config: &'a UpdaterConfig) -> BoxFuture<'a, FeedResult<InstanceSet>>;
}

/// Fetches and parses the upstream health report.
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::Client,
}

impl InstanceSource for FeedClient {
    fn fetch<'a>(&'a self, config: &'a UpdaterConfig) -> BoxFuture<'a, FeedResult<InstanceSet>> {
        Box::pin(self.fetch_instances(config))
    }
}

impl FeedClient {
    pub fn new() -> FeedResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FeedError::Transport)?;
        Ok(Self { http })
    }

    /// Fetch the feed named in `config` and run every entry through the
    /// configured policy.
    pub async fn fetch_instances(&self, config: &UpdaterConfig) -> FeedResult<InstanceSet> {
        let response = self
            .http
            .get(&config.feed_url)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_feed(&body, &FeedPolicy::from_config(config))
    }
}

/// Parse a feed document into the instances that pass `policy`.
///
/// Only a malformed document fails; malformed entries are logged and skipped.
pub fn parse_feed(body: &str, policy: &FeedPolicy) -> FeedResult<InstanceSet> {
    let document: Value = serde_json::from_str(body)?;
    let entries = document
        .get("instances")
        .and_then(Value::as_object)
        .ok_or(FeedError::MissingInstances)?;

    let mut set = InstanceSet::new();
    let mut rejected = 0usize;
    for (url, entry) in entries {
        match visit_instance(url, entry, policy) {
            Some(instance) => {
                set.push(instance);
            }
            None => rejected += 1,
        }
    }

    tracing::info!(
        total = entries.len(),
        accepted = set.len(),
        rejected,
        "Feed ingested"
    );
    Ok(set)
}

fn visit_instance(url: &str, entry: &Value, policy: &FeedPolicy) -> Option<Instance> {
    if !entry.get("timing").is_some_and(|t| !t.is_null()) {
        return None;
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Skipping entry with unparseable URL");
            return None;
        }
    };

    if policy.is_blacklisted(&parsed) {
        tracing::debug!(url = %url, reason = %Rejection::Blacklisted, "Instance rejected");
        return None;
    }

    let report = entry_report(entry);
    if let Err(reason) = policy.admits(&report) {
        tracing::trace!(url = %url, reason = %reason, "Instance rejected");
        return None;
    }

    Some(Instance::new(url, entry_timings(entry)))
}

fn entry_report(entry: &Value) -> EntryReport {
    let or_f = |grade: &str| {
        if grade.is_empty() {
            "F".to_string()
        } else {
            grade.to_string()
        }
    };

    let generator = str_at(entry, "/generator").to_lowercase();
    let fork = generator
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    EntryReport {
        csp_grade: or_f(str_at(entry, "/http/grade")),
        tls_grade: or_f(str_at(entry, "/tls/grade")),
        html_grade: str_at(entry, "/html/grade").to_string(),
        analytics: entry.get("analytics").and_then(Value::as_bool).unwrap_or(false),
        onion: str_at(entry, "/network_type").eq_ignore_ascii_case("tor"),
        dnssec: entry
            .pointer("/network/dnssec")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        fork,
    }
}

fn entry_timings(entry: &Value) -> Timings {
    Timings::new(
        missing_if_unset(f64_at(entry, "/timing/initial/all/value")),
        missing_if_unset(f64_at(entry, "/timing/search/all/median")),
        missing_if_unset(f64_at(entry, "/timing/search_go/all/median")),
        missing_if_unset(f64_at(entry, "/timing/search_wp/all/median")),
    )
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn f64_at(value: &Value, pointer: &str) -> f64 {
    value.pointer(pointer).and_then(Value::as_f64).unwrap_or(0.0)
}
