//! Background refresh of the candidate list.
//!
//! # Data Flow
//! ```text
//! timer tick (update_interval minutes) ─┐
//! RefreshHandle::force_refresh() ───────┼─▶ scheduler.rs
//!                                       │     → feed/: fetch + filter
//!                                       │     → ranking/: score + probe + sort
//!                                       │     → load_balancer/: publish
//! shutdown ─────────────────────────────┘
//! ```

pub mod scheduler;

pub use scheduler::{Phase, RefreshHandle, RefreshScheduler, RefreshStatus};
