//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned and echoed)
//!     → GET /ping, /stats, POST /cmd → admin/
//!     → any other GET:
//!         q is a resolvable bang → bangs/ → 302 to the bang target
//!         else → load_balancer/ current best
//!              → preferences.rs (operator settings appended)
//!              → response.rs (302 + HTML body)
//! ```

pub mod preferences;
pub mod request;
pub mod response;
pub mod server;

pub use preferences::PreferencesCache;
pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
