//! Health feed ingestion subsystem.
//!
//! # Data Flow
//! ```text
//! feed URL (HTTPS)
//!     → ingest.rs: fetch with timeout, parse document
//!     → for each "instances" entry (keyed by URL):
//!         skip without timing block
//!         → policy.rs: blacklist, grades, analytics, network, dnssec, fork
//!         → normalise timings (unset → MISSING)
//!     → InstanceSet (discovery order)
//! ```
//!
//! # Design Decisions
//! - Transport and document errors fail the whole fetch
//! - A bad entry is logged and skipped, never fatal
//! - Policy rejections are not errors

pub mod ingest;
pub mod policy;

use thiserror::Error;

pub use ingest::{parse_feed, FeedClient, InstanceSource};
pub use policy::{FeedPolicy, ForkPreference};

/// Errors that fail a whole ingestion pass.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Feed unreachable or the body could not be read.
    #[error("Feed transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Feed answered with a non-success status.
    #[error("Feed returned HTTP {0}")]
    Status(u16),

    /// Body is not valid JSON.
    #[error("Feed parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document has no `instances` object.
    #[error("Feed document has no instances object")]
    MissingInstances,
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
