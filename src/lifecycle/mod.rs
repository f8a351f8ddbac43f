//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → HTTP server drains → scheduler leaves its loop
//!               → config watcher stops applying updates
//! ```
//!
//! # Design Decisions
//! - A refresh cycle in flight is not interrupted; the loop exits after it
//! - Startup ordering lives in main.rs

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
