//! Bang id lookup and URL template substitution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;

use crate::bangs::catalog::{BangMap, SEARCH_PLACEHOLDER};
use crate::bangs::extract::{BangExtractor, BangQuery};
use crate::bangs::{BangError, CatalogError};
use crate::resilience::RetryPolicy;

/// Resolves `!!<id> <search>` queries to third-party search URLs.
pub struct BangResolver {
    catalog: ArcSwapOption<BangMap>,
    extractor: BangExtractor,
    load_started: AtomicBool,
}

impl BangResolver {
    /// Resolver with no catalog; every lookup fails until [`install`] runs.
    ///
    /// [`install`]: BangResolver::install
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            catalog: ArcSwapOption::empty(),
            extractor: BangExtractor::new(cache_capacity),
            load_started: AtomicBool::new(false),
        }
    }

    pub fn with_catalog(cache_capacity: usize, catalog: BangMap) -> Self {
        let resolver = Self::new(cache_capacity);
        resolver.install(catalog);
        resolver
    }

    pub fn install(&self, catalog: BangMap) {
        tracing::info!(bangs = catalog.len(), "Bang catalog installed");
        self.catalog.store(Some(Arc::new(catalog)));
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.load().is_some()
    }

    /// Load the catalog in a background task, at most once per resolver.
    ///
    /// Returns false when a load was already started, whatever its outcome.
    /// Must be called from within a Tokio runtime.
    pub fn spawn_load(self: &Arc<Self>, url: &str, timeout: Duration) -> bool {
        if self.load_started.swap(true, Ordering::AcqRel) {
            return false;
        }

        let resolver = Arc::clone(self);
        let url = url.to_string();
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            if let Err(e) = resolver
                .load(&client, &url, timeout, RetryPolicy::default())
                .await
            {
                tracing::error!(
                    url = %url,
                    error = %e,
                    "Giving up on bang catalog, bangs will go to the selected instance"
                );
            }
        });
        true
    }

    /// Fetch the catalog and install it, retrying transport and parse
    /// failures per `policy`. Returns the number of bangs installed.
    pub async fn load(
        &self,
        client: &reqwest::Client,
        url: &str,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<usize, CatalogError> {
        let mut attempt = 0;
        loop {
            tokio::time::sleep(policy.delay(attempt)).await;
            attempt += 1;

            match BangMap::fetch(client, url, timeout).await {
                Ok(catalog) => {
                    let count = catalog.len();
                    self.install(catalog);
                    return Ok(count);
                }
                Err(e) if attempt < policy.max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Bang catalog fetch failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn extract(&self, query: &str) -> Result<BangQuery, BangError> {
        self.extractor.extract(query)
    }

    /// True when `query` parses and names a known bang.
    pub fn is_bang(&self, query: &str) -> bool {
        let Ok(parsed) = self.extract(query) else {
            return false;
        };
        self.catalog
            .load()
            .as_ref()
            .is_some_and(|catalog| catalog.contains(&parsed.id))
    }

    /// Build the redirect URL for `query`.
    pub fn resolve(&self, query: &str) -> Result<String, BangError> {
        let parsed = self.extract(query)?;
        let guard = self.catalog.load();
        let catalog = guard.as_ref().ok_or(BangError::CatalogNotLoaded)?;
        let template = catalog
            .template(&parsed.id)
            .ok_or_else(|| BangError::UnknownBang(parsed.id.clone()))?;

        Ok(template.replace(SEARCH_PLACEHOLDER, &urlencoding::encode(&parsed.search)))
    }

    pub fn extractor(&self) -> &BangExtractor {
        &self.extractor
    }
}
