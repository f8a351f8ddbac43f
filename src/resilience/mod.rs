//! Resilience helpers.
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Startup fetches retry with jittered exponential backoff and then give up

pub mod backoff;

pub use backoff::{calculate_backoff, RetryPolicy};
