//! Bang catalog loading.
//!
//! The catalog is a JSON array of objects carrying at least `t` (the bang id)
//! and `u` (the URL template). Other fields are ignored.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::bangs::CatalogError;

/// Token in a URL template that is replaced by the escaped search phrase.
pub const SEARCH_PLACEHOLDER: &str = "{{{s}}}";

#[derive(Debug, Deserialize)]
struct BangEntry {
    t: String,
    u: String,
}

/// Bang id → URL template.
#[derive(Debug, Clone, Default)]
pub struct BangMap {
    templates: HashMap<String, String>,
}

impl BangMap {
    /// Parse a catalog document. The first entry wins for a repeated id.
    pub fn from_json(body: &str) -> Result<Self, CatalogError> {
        let entries: Vec<BangEntry> = serde_json::from_str(body)?;
        let mut templates = HashMap::with_capacity(entries.len());
        for entry in entries {
            templates.entry(entry.t).or_insert(entry.u);
        }
        Ok(Self { templates })
    }

    /// Download and parse the catalog at `url`.
    pub async fn fetch(
        client: &reqwest::Client,
        url: &str,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let response = client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Self::from_json(&body)
    }

    pub fn template(&self, id: &str) -> Option<&str> {
        self.templates.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BangMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut templates = HashMap::new();
        for (id, template) in iter {
            templates.entry(id.into()).or_insert_with(|| template.into());
        }
        Self { templates }
    }
}
