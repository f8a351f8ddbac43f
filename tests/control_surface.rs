//! The running daemon: redirects and control endpoints over real sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use instance_selector::admin::handlers::{
    CommandResponse, StatsResponse, UPDATE_IN_PROGRESS, UPDATE_STARTED,
};
use instance_selector::bangs::{BangMap, BangResolver};
use instance_selector::config::AppConfig;
use instance_selector::feed::FeedClient;
use instance_selector::http::{AppState, HttpServer, PreferencesCache};
use instance_selector::lifecycle::Shutdown;
use instance_selector::load_balancer::RoutingState;
use instance_selector::updater::RefreshScheduler;
use serde_json::json;

mod common;

struct Daemon {
    addr: SocketAddr,
    shutdown: Shutdown,
    server: tokio::task::JoinHandle<Result<(), std::io::Error>>,
    /// Held but never run, so forced refreshes stay pending.
    _idle_scheduler: Option<RefreshScheduler>,
}

/// Start the selector against the feed at `feed`.
async fn start_daemon(feed: SocketAddr, run_scheduler: bool) -> Daemon {
    let mut config = AppConfig::default();
    config.default_instance = "https://fallback.example".into();
    config.updater.feed_url = format!("http://{}/instances.json", feed);
    config.proxy.preferences_url = "https://fallback.example/preferences?preferences=abc123".into();
    let config = Arc::new(ArcSwap::from_pointee(config));

    let shutdown = Shutdown::new();
    let routing = Arc::new(RoutingState::new());
    let (scheduler, refresh) = RefreshScheduler::new(
        config.clone(),
        routing.clone(),
        Arc::new(FeedClient::new().unwrap()),
        Arc::new(common::AlwaysAlive),
    );
    let idle_scheduler = if run_scheduler {
        tokio::spawn(scheduler.run(shutdown.subscribe()));
        None
    } else {
        Some(scheduler)
    };

    let resolver = Arc::new(BangResolver::with_catalog(
        64,
        BangMap::from_json(common::BANG_CATALOG).unwrap(),
    ));

    let server = HttpServer::new(AppState {
        routing,
        resolver,
        refresh,
        config,
        preferences: Arc::new(PreferencesCache::new()),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Daemon {
        addr,
        shutdown,
        server,
        _idle_scheduler: idle_scheduler,
    }
}

async fn command(addr: SocketAddr, name: &str) -> CommandResponse {
    common::client()
        .post(format!("http://{}/cmd", addr))
        .json(&json!({ "name": name, "body": "" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn location(addr: SocketAddr, path: &str) -> String {
    let res = common::client()
        .get(format!("http://{}{}", addr, path))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["cache-control"], "no-store");
    res.headers()["location"].to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_ping_and_redirects() {
    let feed = common::start_mock_backend(common::feed_document(vec![])).await;
    let daemon = start_daemon(feed, false).await;

    let body = common::client()
        .get(format!("http://{}/ping", daemon.addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, format!("instance-selector;{}", std::process::id()));

    assert_eq!(
        location(daemon.addr, "/search?q=rust&category=general").await,
        "https://fallback.example/search?q=rust&category=general&preferences=abc123"
    );
    assert_eq!(
        location(daemon.addr, "/search?q=%21%21rsub+rust").await,
        "https://reddit.com/r/rust"
    );

    daemon.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), daemon.server)
        .await
        .expect("server drains after shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_update_command_reports_in_progress() {
    let feed = common::start_mock_backend(common::feed_document(vec![])).await;
    let daemon = start_daemon(feed, false).await;

    let first = command(daemon.addr, "update").await;
    assert_eq!(first.body, UPDATE_STARTED);
    assert!(first.error.is_empty());

    // Nothing consumes the request, so it stays pending
    let second = command(daemon.addr, "update").await;
    assert_eq!(second.body, UPDATE_IN_PROGRESS);

    let invalid = command(daemon.addr, "reboot").await;
    assert!(invalid.body.is_empty());
    assert_eq!(invalid.error, "Invalid command: \"reboot\"");

    daemon.shutdown.trigger();
}

#[tokio::test]
async fn test_stats_after_refresh() {
    let document = common::feed_document(vec![
        ("https://b.example/".into(), common::feed_entry(0.6, 1.2, 0.6, 0.6)),
        ("https://a.example/".into(), common::feed_entry(0.4, 0.8, 0.4, 0.4)),
    ]);
    let feed = common::start_mock_backend(document).await;
    let daemon = start_daemon(feed, true).await;

    // The first cycle starts immediately
    let mut stats = None;
    for _ in 0..100 {
        let res: StatsResponse = common::client()
            .get(format!("http://{}/stats", daemon.addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if res.candidates.len() == 2 {
            stats = Some(res);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let stats = stats.expect("refresh cycle published two candidates");
    let urls: Vec<_> = stats.candidates.iter().map(|c| c.url()).collect();
    assert_eq!(urls, vec!["https://a.example/", "https://b.example/"]);

    assert_eq!(
        location(daemon.addr, "/").await,
        "https://a.example/?preferences=abc123"
    );

    let via_command = command(daemon.addr, "stats").await;
    let parsed: StatsResponse = serde_json::from_str(&via_command.body).unwrap();
    assert!(parsed.candidates.front().unwrap().is_current);

    daemon.shutdown.trigger();
}

#[tokio::test]
async fn test_bang_catalog_loads_when_reload_enables_fast_bangs() {
    let catalog = common::start_mock_backend(common::BANG_CATALOG.to_string()).await;
    let feed = common::start_mock_backend(common::feed_document(vec![])).await;

    let mut config = AppConfig::default();
    config.default_instance = "https://fallback.example".into();
    config.updater.feed_url = format!("http://{}/instances.json", feed);
    config.proxy.fast_bangs = false;
    config.proxy.bang_catalog_url = format!("http://{}/bang.js", catalog);
    let live = Arc::new(ArcSwap::from_pointee(config.clone()));

    let shutdown = Shutdown::new();
    let routing = Arc::new(RoutingState::new());
    let (_scheduler, refresh) = RefreshScheduler::new(
        live.clone(),
        routing.clone(),
        Arc::new(FeedClient::new().unwrap()),
        Arc::new(common::AlwaysAlive),
    );
    let resolver = Arc::new(BangResolver::new(64));
    let server = HttpServer::new(AppState {
        routing,
        resolver: resolver.clone(),
        refresh,
        config: live.clone(),
        preferences: Arc::new(PreferencesCache::new()),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    assert_eq!(
        location(addr, "/search?q=%21%21rsub+rust").await,
        "https://fallback.example/search?q=%21%21rsub+rust"
    );
    assert!(!resolver.is_loaded());

    config.proxy.fast_bangs = true;
    live.store(Arc::new(config));

    // The first request after the reload starts the catalog load
    location(addr, "/search?q=%21%21rsub+rust").await;
    for _ in 0..100 {
        if resolver.is_loaded() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(resolver.is_loaded(), "catalog loaded after fast_bangs was enabled");
    assert_eq!(
        location(addr, "/search?q=%21%21rsub+rust").await,
        "https://reddit.com/r/rust"
    );

    shutdown.trigger();
}
