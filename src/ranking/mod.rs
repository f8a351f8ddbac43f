//! Instance ranking subsystem ("the judge").
//!
//! # Data Flow
//! ```text
//! InstanceSet (feed/ingest.rs)
//!     → instance.rs: per-dimension means over positive samples
//!     → outlier.rs: any outlying dimension drops the instance
//!     → judge.rs: score = Σ sample / weight, floored to 0.01
//!     → health/: light probe, intensive re-check of failures
//!     → stable sort ascending
//!     → CandidateList (candidate.rs)
//! ```
//!
//! # Design Decisions
//! - Lower score is better
//! - A missing sample in any dimension excludes the instance
//! - Ranking is deterministic for a fixed input and prober

pub mod candidate;
pub mod grade;
pub mod instance;
pub mod judge;
pub mod outlier;

pub use candidate::{Candidate, CandidateList};
pub use grade::grade_value;
pub use instance::{Instance, InstanceSet, Timings, MISSING};
pub use judge::Judge;
pub use outlier::is_outlier;
