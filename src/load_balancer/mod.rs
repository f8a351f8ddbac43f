//! Instance selection subsystem.
//!
//! # Data Flow
//! ```text
//! Refresh scheduler (sole writer)
//!     → state.rs publish(CandidateList)   [swap under lock]
//!
//! Request handler (readers)
//!     → state.rs current_best()            [rotate "current" flag, read front]
//!     → 302 to the returned URL
//!
//! Control endpoint
//!     → state.rs snapshot()                [clone for /stats]
//! ```
//!
//! # Design Decisions
//! - No per-request balancing: every request goes to the best instance
//! - Exactly zero or one candidate is marked current
//! - The published list is never empty once seeded

pub mod state;

pub use state::RoutingState;
