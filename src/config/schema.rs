//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the selector.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the instance selector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instance handed out before the first refresh and whenever ranking
    /// yields nothing.
    pub default_instance: String,

    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Redirector behaviour (preferences, fast bangs).
    pub proxy: ProxyConfig,

    /// Refresh cycle, ranking weights and filtering criteria.
    pub updater: UpdaterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_instance: "https://paulgo.io".to_string(),
            listener: ListenerConfig::default(),
            proxy: ProxyConfig::default(),
            updater: UpdaterConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Redirector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// A search URL exported from an instance's preferences page. Its
    /// `preferences` parameter is forwarded on every redirect.
    pub preferences_url: String,

    /// Resolve `!!bang` queries locally instead of sending them to an instance.
    pub fast_bangs: bool,

    /// Location of the bang catalog (JSON array of `{t, u}` objects). Fetched
    /// once per process, so a reloaded URL applies after a restart.
    pub bang_catalog_url: String,

    /// Number of parsed queries kept in the extraction cache. Read at startup only.
    pub bang_cache_capacity: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            preferences_url: String::new(),
            fast_bangs: true,
            bang_catalog_url: "https://duckduckgo.com/bang.js".to_string(),
            bang_cache_capacity: 2048,
        }
    }
}

/// Refresh cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Minutes between refresh cycles.
    pub update_interval: u64,

    /// Health feed document.
    pub feed_url: String,

    /// Timeout for the feed fetch in seconds.
    pub fetch_timeout_secs: u64,

    /// Instances that are never selected, matched by host.
    pub instance_blacklist: Vec<String>,

    /// Ranking weights.
    pub advanced: AdvancedConfig,

    /// Static policy filters applied during ingestion.
    pub criteria: CriteriaConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            update_interval: 180,
            feed_url: "https://searx.space/data/instances.json".to_string(),
            fetch_timeout_secs: 30,
            instance_blacklist: Vec::new(),
            advanced: AdvancedConfig::default(),
            criteria: CriteriaConfig::default(),
        }
    }
}

/// Latency weights and outlier threshold.
///
/// A larger weight makes a dimension count less towards the score but more
/// towards the outlier test.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvancedConfig {
    pub initial_resp_weight: f64,
    pub search_resp_weight: f64,
    pub google_search_resp_weight: f64,
    pub wikipedia_search_resp_weight: f64,
    pub outlier_multiplier: f64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            initial_resp_weight: 1.2,
            search_resp_weight: 1.2,
            google_search_resp_weight: 0.6,
            wikipedia_search_resp_weight: 0.8,
            outlier_multiplier: 2.0,
        }
    }
}

/// Quality and privacy criteria.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CriteriaConfig {
    pub minimum_csp_grade: String,
    pub minimum_tls_grade: String,
    pub allowed_http_grades: Vec<String>,
    pub allow_analytics: bool,
    pub is_onion: bool,
    pub require_dnssec: bool,
    pub searxng_preference: String,
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        Self {
            minimum_csp_grade: "F".to_string(),
            minimum_tls_grade: "C".to_string(),
            allowed_http_grades: ["V", "F", "C", "CJS", "E"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
            allow_analytics: false,
            is_onion: false,
            require_dnssec: false,
            searxng_preference: "impartial".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
