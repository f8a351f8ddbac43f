//! Bang query extraction with a bounded result cache.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;

use crate::bangs::BangError;
use crate::observability::metrics;

/// `!!`, a non-whitespace id, then an optional search phrase.
static BANG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^!!(\S+)\s*(.*)$").expect("bang pattern is valid"));

/// A parsed bang query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BangQuery {
    pub id: String,
    /// Search phrase with surrounding whitespace removed. May be empty.
    pub search: String,
}

/// Parse `query` without consulting any cache.
pub fn parse_bang(query: &str) -> Result<BangQuery, BangError> {
    let captures = BANG_PATTERN
        .captures(query.trim_start())
        .ok_or(BangError::NoMatch)?;

    let id = captures.get(1).map_or("", |m| m.as_str());
    let search = captures.get(2).map_or("", |m| m.as_str().trim());
    Ok(BangQuery {
        id: id.to_string(),
        search: search.to_string(),
    })
}

/// Extraction results keyed by the exact raw query.
pub struct BangExtractor {
    cache: Mutex<LruCache<String, Result<BangQuery, BangError>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BangExtractor {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached [`parse_bang`]. The pattern runs outside the cache lock.
    pub fn extract(&self, query: &str) -> Result<BangQuery, BangError> {
        if let Some(cached) = self.cache.lock().get(query) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_bang_cache(true);
            return cached.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_bang_cache(false);

        let parsed = parse_bang(query);
        self.cache.lock().put(query.to_string(), parsed.clone());
        parsed
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            capacity: cache.cap().get(),
            size: cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Extraction cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub capacity: usize,
    pub size: usize,
    pub hits: u64,
    /// Each miss is one pattern evaluation.
    pub misses: u64,
}
