//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router: redirector plus control endpoints
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::{Request, State},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::bangs::BangResolver;
use crate::config::AppConfig;
use crate::http::PreferencesCache;
use crate::http::request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
use crate::http::response::{build_redirect_url, redirect};
use crate::load_balancer::RoutingState;
use crate::observability::metrics;
use crate::updater::RefreshHandle;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<RoutingState>,
    pub resolver: Arc<BangResolver>,
    pub refresh: RefreshHandle,
    pub config: Arc<ArcSwap<AppConfig>>,
    pub preferences: Arc<PreferencesCache>,
}

/// HTTP front end of the selector.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let timeout = Duration::from_secs(state.config.load().listener.request_timeout_secs);
        Self {
            router: Self::build_router(state, timeout),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, timeout: Duration) -> Router {
        Router::new()
            .merge(admin::routes())
            .route("/", get(redirect_handler))
            .route("/{*path}", get(redirect_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Redirect to a resolved bang, or to the current best instance.
async fn redirect_handler(State(state): State<AppState>, request: Request) -> Response {
    let config = state.config.load();
    let uri = request.uri();

    if config.proxy.fast_bangs {
        // Covers fast_bangs being switched on by a reload
        if !state.resolver.is_loaded() {
            let timeout = Duration::from_secs(config.updater.fetch_timeout_secs);
            state.resolver.spawn_load(&config.proxy.bang_catalog_url, timeout);
        }

        if let Some(query) = search_query(uri.query()) {
            match state.resolver.resolve(&query) {
                Ok(target) => {
                    tracing::debug!(
                        request_id = %request.request_id(),
                        target = %target,
                        "Bang redirect"
                    );
                    metrics::record_redirect("bang");
                    return redirect(&target);
                }
                Err(e) => {
                    tracing::trace!(request_id = %request.request_id(), reason = %e, "No bang redirect");
                }
            }
        }
    }

    let base = state.routing.current_best().unwrap_or_else(|| {
        tracing::warn!("Routing state is empty, using default instance");
        config.default_instance.clone()
    });

    let preferences = state.preferences.get(&config.proxy.preferences_url);

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let target = build_redirect_url(&base, path_and_query, preferences.as_deref());

    tracing::debug!(request_id = %request.request_id(), target = %target, "Instance redirect");
    metrics::record_redirect("instance");
    redirect(&target)
}

/// Decoded value of the `q` parameter, if present and non-empty.
fn search_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
