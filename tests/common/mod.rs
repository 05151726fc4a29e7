//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use locatario_gateway::config::GatewayConfig;
use locatario_gateway::gateway::{Clock, Gateway};
use locatario_gateway::{HttpServer, Shutdown};

/// One request observed by a mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path and query exactly as received.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// A mock upstream that records every request and answers with a fixed
/// status and body.
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub async fn start(status: u16, reply: &'static str) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = calls.clone();
        let status = StatusCode::from_u16(status).unwrap();

        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(Recorded {
                        method,
                        uri: uri.to_string(),
                        headers,
                        body,
                    });
                    (status, [("content-type", "application/json")], reply)
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, calls }
    }

    /// Base URL with a path prefix, like the real APIs.
    pub fn url(&self, prefix: &str) -> String {
        format!("http://{}/{}", self.addr, prefix)
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.calls().pop().expect("upstream was never called")
    }
}

/// Base URL where nothing is listening.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/APIDatos", addr)
}

/// A running gateway bound to an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start(data_url: String, catalog_url: String, clock: Option<Arc<dyn Clock>>) -> Self {
        let mut config = GatewayConfig::default();
        config.upstreams.data_url = data_url;
        config.upstreams.catalog_url = catalog_url;

        let mut gateway = Gateway::new(&config.upstreams).unwrap();
        if let Some(clock) = clock {
            gateway = gateway.with_clock(clock);
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let server = HttpServer::with_gateway(config, gateway);
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self { addr, client, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
