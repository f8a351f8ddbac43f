//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use instance_selector::health::{LatencyProbeResult, ProbeSpec, Prober};

/// Start a mock HTTP server that answers every request with `(status, body)`
/// from `f`. Returns the bound address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a mock HTTP server that always returns 200 with `body`.
pub async fn start_mock_backend(body: String) -> SocketAddr {
    start_programmable_backend(move || {
        let body = body.clone();
        async move { (200, body) }
    })
    .await
}

/// Consume the request line and headers so closing the socket does not
/// reset the connection under the client.
async fn read_request_head(socket: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match tokio::time::timeout(Duration::from_secs(2), socket.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => head.extend_from_slice(&buf[..n]),
            _ => break,
        }
    }
}

/// Accepts connections and drops them: a host that is up for TCP probes.
pub async fn start_live_host() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// One feed entry that passes the default policy.
pub fn feed_entry(initial: f64, search: f64, google: f64, wikipedia: f64) -> Value {
    json!({
        "http": { "grade": "A" },
        "tls": { "grade": "A+" },
        "html": { "grade": "V" },
        "analytics": false,
        "network_type": "normal",
        "network": { "dnssec": 1 },
        "generator": "searxng/2024.5.1",
        "timing": {
            "initial": { "all": { "value": initial } },
            "search": { "all": { "median": search } },
            "search_go": { "all": { "median": google } },
            "search_wp": { "all": { "median": wikipedia } },
        },
    })
}

/// Feed document from `(url, entry)` pairs, in order.
pub fn feed_document(entries: Vec<(String, Value)>) -> String {
    let instances: serde_json::Map<String, Value> = entries.into_iter().collect();
    json!({ "metadata": { "timestamp": 0 }, "instances": instances }).to_string()
}

pub const BANG_CATALOG: &str = r#"[
    {"c": "Online Services", "s": "Google", "t": "g", "u": "https://www.google.com/search?q={{{s}}}"},
    {"c": "Multimedia", "s": "YouTube", "t": "yt", "u": "https://www.youtube.com/results?search_query={{{s}}}"},
    {"c": "Online Services", "s": "Reddit", "t": "rsub", "u": "https://reddit.com/r/{{{s}}}"}
]"#;

/// Prober that reports every host alive.
pub struct AlwaysAlive;

impl Prober for AlwaysAlive {
    fn probe_host(&self, url: String, _spec: ProbeSpec) -> BoxFuture<'static, LatencyProbeResult> {
        Box::pin(async move {
            LatencyProbeResult {
                url,
                is_alive: true,
                avg_rtt: Duration::from_millis(1),
                packet_loss: 0.0,
            }
        })
    }
}

/// HTTP client that does not follow redirects or reuse connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
