//! Static per-instance policy filters.
//!
//! # Design Decisions
//! - Policy violations are silent exclusions, not errors
//! - The policy is rebuilt from config every cycle so reloads apply
//! - Grades are compared on the [`grade_value`] scale

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::config::UpdaterConfig;
use crate::ranking::grade::{grade_value, normalize_grade};

/// DNSSEC status code the feed reports for a validated zone.
pub const DNSSEC_SECURE: i64 = 1;

/// Preference for the SearXNG fork over the original searx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForkPreference {
    /// Reject instances running the original searx.
    Required,
    /// Reject instances running SearXNG.
    Forbidden,
    #[default]
    Impartial,
}

impl FromStr for ForkPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" => Ok(ForkPreference::Required),
            "forbidden" => Ok(ForkPreference::Forbidden),
            "impartial" => Ok(ForkPreference::Impartial),
            other => Err(format!("unknown fork preference: {}", other)),
        }
    }
}

impl ForkPreference {
    /// Whether an instance whose generator names `fork` is acceptable.
    pub fn admits(self, fork: &str) -> bool {
        match self {
            ForkPreference::Required => fork != "searx",
            ForkPreference::Forbidden => fork != "searxng",
            ForkPreference::Impartial => true,
        }
    }
}

/// The fields of one feed entry that the policy looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryReport {
    pub csp_grade: String,
    pub tls_grade: String,
    pub html_grade: String,
    pub analytics: bool,
    pub onion: bool,
    pub dnssec: i64,
    /// Lower-cased fork name from the generator string, e.g. `searxng`.
    pub fork: String,
}

/// Why an entry was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Blacklisted,
    CspGrade,
    TlsGrade,
    HtmlGrade,
    Analytics,
    NetworkType,
    Dnssec,
    Fork,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Blacklisted => "blacklisted",
            Rejection::CspGrade => "csp grade below minimum",
            Rejection::TlsGrade => "tls grade below minimum",
            Rejection::HtmlGrade => "html grade not allowed",
            Rejection::Analytics => "analytics enabled",
            Rejection::NetworkType => "network type mismatch",
            Rejection::Dnssec => "dnssec not secure",
            Rejection::Fork => "fork preference",
        };
        f.write_str(reason)
    }
}

/// Filters derived from the updater configuration.
#[derive(Debug, Clone)]
pub struct FeedPolicy {
    blacklist: Vec<(String, Option<u16>)>,
    min_csp: i32,
    min_tls: i32,
    allowed_html: Vec<String>,
    allow_analytics: bool,
    is_onion: bool,
    require_dnssec: bool,
    fork: ForkPreference,
}

impl FeedPolicy {
    pub fn from_config(config: &UpdaterConfig) -> Self {
        let blacklist = config
            .instance_blacklist
            .iter()
            .filter_map(|entry| match Url::parse(entry) {
                Ok(url) => url.host_str().map(|h| (h.to_string(), url.port())),
                Err(e) => {
                    tracing::warn!(url = %entry, error = %e, "Ignoring unparseable blacklist entry");
                    None
                }
            })
            .collect();

        let criteria = &config.criteria;
        let fork = criteria.searxng_preference.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Treating fork preference as impartial");
            ForkPreference::Impartial
        });

        Self {
            blacklist,
            min_csp: grade_value(&normalize_grade(&criteria.minimum_csp_grade)),
            min_tls: grade_value(&normalize_grade(&criteria.minimum_tls_grade)),
            allowed_html: criteria
                .allowed_http_grades
                .iter()
                .map(|g| g.to_lowercase())
                .collect(),
            allow_analytics: criteria.allow_analytics,
            is_onion: criteria.is_onion,
            require_dnssec: criteria.require_dnssec,
            fork,
        }
    }

    /// Exact host (and explicit port) match against the blacklist.
    pub fn is_blacklisted(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.blacklist
            .iter()
            .any(|(b_host, b_port)| b_host == host && *b_port == url.port())
    }

    /// Apply the grade, analytics, network and fork filters in order.
    pub fn admits(&self, report: &EntryReport) -> Result<(), Rejection> {
        if grade_value(&report.csp_grade) < self.min_csp {
            return Err(Rejection::CspGrade);
        }
        if grade_value(&report.tls_grade) < self.min_tls {
            return Err(Rejection::TlsGrade);
        }
        let html = report.html_grade.to_lowercase();
        if !self.allowed_html.iter().any(|g| *g == html) {
            return Err(Rejection::HtmlGrade);
        }
        if report.analytics && !self.allow_analytics {
            return Err(Rejection::Analytics);
        }
        if report.onion != self.is_onion {
            return Err(Rejection::NetworkType);
        }
        if self.require_dnssec && report.dnssec != DNSSEC_SECURE {
            return Err(Rejection::Dnssec);
        }
        if !self.fork.admits(&report.fork) {
            return Err(Rejection::Fork);
        }
        Ok(())
    }
}
