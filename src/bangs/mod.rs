//! Fast-path bang resolution.
//!
//! # Data Flow
//! ```text
//! Startup, or first request once proxy.fast_bangs is on (one load per process):
//!     catalog URL → catalog.rs: fetch + parse {t, u} array → BangMap
//!     → resolver.rs: install (retried with backoff on failure)
//!
//! Per request (q parameter):
//!     → extract.rs: LRU lookup by exact query, else regex parse + cache
//!     → resolver.rs: look up id, percent-encode search, fill template
//!     → redirect URL, or BangError so the caller falls back
//! ```
//!
//! # Design Decisions
//! - The catalog is read-only once installed and swapped in whole
//! - The extraction cache has its own lock, separate from routing state
//! - Parse failures are cached too, so repeated non-bang queries stay cheap

pub mod catalog;
pub mod extract;
pub mod resolver;

use thiserror::Error;

pub use catalog::{BangMap, SEARCH_PLACEHOLDER};
pub use extract::{BangExtractor, BangQuery};
pub use resolver::BangResolver;

/// Why a query could not be turned into a bang redirect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BangError {
    /// Query is not of the form `!!<id> [search]`.
    #[error("query is not a bang")]
    NoMatch,

    #[error("unknown bang: {0}")]
    UnknownBang(String),

    #[error("bang catalog not loaded")]
    CatalogNotLoaded,
}

/// Errors loading the bang catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog returned HTTP {0}")]
    Status(u16),

    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
