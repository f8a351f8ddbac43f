//! Search preferences carried on redirects.
//!
//! Operators export their settings from an instance's preferences page as a
//! URL with a single `preferences` query parameter. That value is appended
//! to every instance redirect so settings follow the user between instances.

use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

/// Preferences extracted from the configured URL, kept until the URL changes.
#[derive(Debug, Default)]
pub struct PreferencesCache {
    cached: Mutex<Option<(String, Option<Arc<str>>)>>,
}

impl PreferencesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferences for `preferences_url`. An empty URL means none are set.
    pub fn get(&self, preferences_url: &str) -> Option<Arc<str>> {
        if preferences_url.is_empty() {
            return None;
        }

        let mut cached = self.cached.lock();
        if let Some((url, value)) = cached.as_ref() {
            if url == preferences_url {
                return value.clone();
            }
        }

        let value = extract_preferences(preferences_url).map(Arc::from);
        *cached = Some((preferences_url.to_string(), value.clone()));
        value
    }
}

/// The `preferences` value from a preferences URL.
///
/// `None` when the URL does not parse, or when the parameter is absent,
/// empty or repeated.
pub fn extract_preferences(preferences_url: &str) -> Option<String> {
    let url = match Url::parse(preferences_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(url = %preferences_url, error = %e, "Could not parse preferences URL");
            return None;
        }
    };

    let mut values = url
        .query_pairs()
        .filter(|(key, _)| key == "preferences")
        .map(|(_, value)| value.into_owned());

    match (values.next(), values.next()) {
        (Some(value), None) if !value.is_empty() => Some(value),
        (Some(_), Some(_)) => {
            tracing::warn!(url = %preferences_url, "Too many \"preferences\" parameters in preferences URL");
            None
        }
        _ => {
            tracing::warn!(url = %preferences_url, "No \"preferences\" parameter in preferences URL");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_single_value() {
        assert_eq!(
            extract_preferences("https://searx.example/preferences?preferences=eJx1kE1u&save=1").as_deref(),
            Some("eJx1kE1u")
        );
    }

    #[test]
    fn test_cache_extracts_once_per_url() {
        let cache = PreferencesCache::new();
        assert_eq!(cache.get(""), None);

        let first = cache.get("https://searx.example/?preferences=abc").unwrap();
        let again = cache.get("https://searx.example/?preferences=abc").unwrap();
        assert_eq!(&*first, "abc");
        assert!(Arc::ptr_eq(&first, &again));

        let changed = cache.get("https://searx.example/?preferences=xyz").unwrap();
        assert_eq!(&*changed, "xyz");

        assert_eq!(cache.get("https://searx.example/?preferences="), None);
        assert_eq!(cache.get("https://searx.example/?preferences="), None);
        assert_eq!(cache.get("https://searx.example/?preferences=abc").as_deref(), Some("abc"));
    }

    #[test]
    fn test_rejects_missing_empty_or_repeated() {
        assert_eq!(extract_preferences("https://searx.example/preferences"), None);
        assert_eq!(extract_preferences("https://searx.example/?preferences="), None);
        assert_eq!(extract_preferences("https://searx.example/?preferences=a&preferences=b"), None);
        assert_eq!(extract_preferences("not a url"), None);
    }
}
