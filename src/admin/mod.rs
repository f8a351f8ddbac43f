//! Control endpoints used by `selector-cli` and for diagnostics.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;
use self::handlers::*;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/stats", get(get_stats))
        .route("/cmd", post(run_command))
}
