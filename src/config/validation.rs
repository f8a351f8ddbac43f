//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (weights, intervals, addresses)
//! - Check that letter grades and enumerated options are recognised
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;
use crate::feed::policy::ForkPreference;

/// Accepts `A+`..`D-` and `F`, case-insensitive, surrounding whitespace allowed.
static LETTER_GRADE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[a-dA-D][-+]?|[fF])\s*$").expect("valid grade pattern"));

const HTML_GRADES: &[&str] = &["v", "f", "c", "cjs", "e", "👁️"];
const LETTER_GRADES: &str = "A+, A, A-, B+, B, B-, C+, C, C-, D+, D, D-, F";

/// Longest refresh interval in minutes: an `i64` count of nanoseconds.
pub const MAX_UPDATE_INTERVAL: u64 = i64::MAX as u64 / 60_000_000_000;

/// A single rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for \"{key}\": \"{given}\". Accepted: {accepted}")]
pub struct ValidationError {
    pub key: String,
    pub given: String,
    pub accepted: String,
}

impl ValidationError {
    fn new(key: impl Into<String>, given: impl ToString, accepted: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            given: given.to_string(),
            accepted: accepted.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if Url::parse(&config.default_instance).is_err() {
        errors.push(ValidationError::new(
            "default_instance",
            &config.default_instance,
            "Any absolute URL",
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            &config.listener.bind_address,
            "A socket address such as 127.0.0.1:8080",
        ));
    }

    if !(1..=MAX_UPDATE_INTERVAL).contains(&config.updater.update_interval) {
        errors.push(ValidationError::new(
            "updater.update_interval",
            config.updater.update_interval,
            format!("1..={} minutes", MAX_UPDATE_INTERVAL),
        ));
    }

    if Url::parse(&config.updater.feed_url).is_err() {
        errors.push(ValidationError::new(
            "updater.feed_url",
            &config.updater.feed_url,
            "Any absolute URL",
        ));
    }

    let advanced = &config.updater.advanced;
    for (key, weight) in [
        ("updater.advanced.initial_resp_weight", advanced.initial_resp_weight),
        ("updater.advanced.search_resp_weight", advanced.search_resp_weight),
        ("updater.advanced.google_search_resp_weight", advanced.google_search_resp_weight),
        ("updater.advanced.wikipedia_search_resp_weight", advanced.wikipedia_search_resp_weight),
    ] {
        if !(weight > 0.0 && weight < 2.0) {
            errors.push(ValidationError::new(key, weight, "Any number n: 0 < n < 2"));
        }
    }

    if !(advanced.outlier_multiplier > 0.0) {
        errors.push(ValidationError::new(
            "updater.advanced.outlier_multiplier",
            advanced.outlier_multiplier,
            "Any positive number",
        ));
    }

    let criteria = &config.updater.criteria;
    if !LETTER_GRADE.is_match(&criteria.minimum_csp_grade) {
        errors.push(ValidationError::new(
            "updater.criteria.minimum_csp_grade",
            &criteria.minimum_csp_grade,
            LETTER_GRADES,
        ));
    }
    if !LETTER_GRADE.is_match(&criteria.minimum_tls_grade) {
        errors.push(ValidationError::new(
            "updater.criteria.minimum_tls_grade",
            &criteria.minimum_tls_grade,
            LETTER_GRADES,
        ));
    }

    for grade in &criteria.allowed_http_grades {
        if !HTML_GRADES.contains(&grade.to_lowercase().as_str()) {
            errors.push(ValidationError::new(
                "updater.criteria.allowed_http_grades",
                grade,
                HTML_GRADES.join(", "),
            ));
        }
    }

    if criteria.searxng_preference.parse::<ForkPreference>().is_err() {
        errors.push(ValidationError::new(
            "updater.criteria.searxng_preference",
            &criteria.searxng_preference,
            "required, forbidden, impartial",
        ));
    }

    for (i, entry) in config.updater.instance_blacklist.iter().enumerate() {
        let has_host = Url::parse(entry)
            .map(|url| url.host_str().is_some())
            .unwrap_or(false);
        if !has_host {
            errors.push(ValidationError::new(
                format!("updater.instance_blacklist[{}]", i),
                entry,
                "Any URL with a host",
            ));
        }
    }

    if !config.proxy.preferences_url.is_empty()
        && crate::http::preferences::extract_preferences(&config.proxy.preferences_url).is_none()
    {
        errors.push(ValidationError::new(
            "proxy.preferences_url",
            &config.proxy.preferences_url,
            "A URL carrying exactly one \"preferences\" parameter",
        ));
    }

    if config.proxy.fast_bangs && config.proxy.bang_cache_capacity == 0 {
        errors.push(ValidationError::new(
            "proxy.bang_cache_capacity",
            config.proxy.bang_cache_capacity,
            "Any positive number",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.default_instance = "not a url".into();
        config.updater.advanced.search_resp_weight = 2.0;
        config.updater.advanced.google_search_resp_weight = 0.0;
        config.updater.criteria.searxng_preference = "sometimes".into();

        let errors = validate_config(&config).unwrap_err();
        let keys: Vec<_> = errors.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "default_instance",
                "updater.advanced.search_resp_weight",
                "updater.advanced.google_search_resp_weight",
                "updater.criteria.searxng_preference",
            ]
        );
    }

    #[test]
    fn test_update_interval_bounds() {
        let mut config = AppConfig::default();
        config.updater.update_interval = MAX_UPDATE_INTERVAL;
        assert!(validate_config(&config).is_ok());

        for interval in [0, MAX_UPDATE_INTERVAL + 1, u64::MAX / 2, u64::MAX] {
            config.updater.update_interval = interval;
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].key, "updater.update_interval");
            assert_eq!(errors[0].accepted, "1..=153722867 minutes");
        }
    }

    #[test]
    fn test_letter_grades() {
        for grade in ["A+", " b- ", "c", "F", "d+"] {
            assert!(LETTER_GRADE.is_match(grade), "{grade} should be accepted");
        }
        for grade in ["E", "A + ", "", "F+", "AA"] {
            assert!(!LETTER_GRADE.is_match(grade), "{grade} should be rejected");
        }
    }

    #[test]
    fn test_html_grades_case_insensitive() {
        let mut config = AppConfig::default();
        config.updater.criteria.allowed_http_grades = vec!["cJs".into(), "x".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].given, "x");
    }

    #[test]
    fn test_blacklist_needs_host() {
        let mut config = AppConfig::default();
        config.updater.instance_blacklist = vec!["https://ok.example".into(), "nohost".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].key, "updater.instance_blacklist[1]");
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("updater.update_interval", 0, "Any positive number of minutes");
        assert_eq!(
            err.to_string(),
            "Invalid value for \"updater.update_interval\": \"0\". Accepted: Any positive number of minutes"
        );
    }
}
