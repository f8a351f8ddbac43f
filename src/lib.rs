//! Health-aware search instance selector.

pub mod config;
pub mod feed;
pub mod health;
pub mod ranking;

pub mod bangs;
pub mod load_balancer;
pub mod updater;

pub mod admin;
pub mod http;

pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
