//! Liveness probing subsystem.
//!
//! # Data Flow
//! ```text
//! Scored candidates (ranking/judge.rs)
//!     → probe.rs: light tier, one task per host
//!     → hosts not alive → probe.rs: intensive tier
//!     → hosts still not alive are dropped
//!
//! Transport (tcp.rs):
//!     TCP handshake round trips to the instance's host
//! ```
//!
//! # Design Decisions
//! - Two tiers so one dropped probe does not exclude a good instance
//! - Every probe run carries an overall deadline
//! - Results are transient and live only within one ranking pass

pub mod probe;
pub mod tcp;

pub use probe::{probe_all, LatencyProbeResult, ProbeSpec, ProbeTier, Prober};
pub use tcp::TcpEchoProber;
