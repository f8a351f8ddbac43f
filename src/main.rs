//! Instance selector daemon.
//!
//! Keeps a ranked list of public search instances fresh in the background
//! and answers every request with a 302 to the best one.
//!
//! # Architecture Overview
//!
//! ```text
//!   health feed ──▶ feed ──▶ ranking ──▶ health (probes)
//!                                │
//!              updater (timer / forced) ──publish──▶ load_balancer
//!                                                        │
//!   client ──▶ http ──▶ bangs (q=!!id …) ──▶ 302 bang target
//!                 └────▶ current best ────────▶ 302 instance
//!                 └────▶ admin (/ping /stats /cmd)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use clap::Parser;
use tokio::net::TcpListener;

use instance_selector::bangs::BangResolver;
use instance_selector::config::watcher::{apply_updates, ConfigWatcher};
use instance_selector::config::{load_or_default, resolve_config_path};
use instance_selector::feed::FeedClient;
use instance_selector::health::TcpEchoProber;
use instance_selector::http::{AppState, HttpServer, PreferencesCache};
use instance_selector::lifecycle::{wait_for_signal, Shutdown};
use instance_selector::load_balancer::RoutingState;
use instance_selector::observability::{logging, metrics};
use instance_selector::updater::RefreshScheduler;

#[derive(Parser)]
#[command(name = "instance-selector", version)]
#[command(about = "Redirects searches to the best available public search instance")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config);
    let config = load_or_default(config_path.as_deref())?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "instance-selector starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        default_instance = %config.default_instance,
        update_interval_minutes = config.updater.update_interval,
        fast_bangs = config.proxy.fast_bangs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let live_config = Arc::new(ArcSwap::from_pointee(config));
    let shutdown = Shutdown::new();

    // Routing state is seeded by the scheduler before any request is served
    let routing = Arc::new(RoutingState::new());
    let (scheduler, refresh) = RefreshScheduler::new(
        live_config.clone(),
        routing.clone(),
        Arc::new(FeedClient::new()?),
        Arc::new(TcpEchoProber::new()),
    );
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    let resolver = Arc::new(BangResolver::new(
        live_config.load().proxy.bang_cache_capacity,
    ));
    let startup = live_config.load();
    if startup.proxy.fast_bangs {
        let timeout = Duration::from_secs(startup.updater.fetch_timeout_secs);
        resolver.spawn_load(&startup.proxy.bang_catalog_url, timeout);
    }
    drop(startup);

    // Keep the watcher alive for the lifetime of the process
    let _watcher = match config_path.filter(|p| p.exists()) {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            tokio::spawn(apply_updates(live_config.clone(), updates, shutdown.subscribe()));
            match watcher.run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let listener = TcpListener::bind(&bind_address).await?;
    let server = HttpServer::new(AppState {
        routing,
        resolver,
        refresh,
        config: live_config,
        preferences: Arc::new(PreferencesCache::new()),
    });
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    tracing::info!("Shutting down");
    shutdown.trigger();

    match server_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server error"),
        Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        Ok(Ok(())) => {}
    }
    if let Err(e) = scheduler_task.await {
        tracing::error!(error = %e, "Refresh scheduler task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
