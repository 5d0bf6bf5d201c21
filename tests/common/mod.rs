//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use garuda_relay::{HttpServer, RelayConfig, Shutdown};

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What the mock backend answers.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl MockReply {
    pub fn json(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: Some("application/json"),
            body: body.as_bytes().to_vec(),
        }
    }
}

type Responder = dyn Fn(&Captured) -> MockReply + Send + Sync;

struct BackendState {
    responder: Box<Responder>,
    captured: Mutex<Vec<Captured>>,
}

/// A running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<BackendState>,
}

impl MockBackend {
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }
}

/// Start a mock backend that returns a fixed response.
pub async fn start_mock_backend(reply: MockReply) -> MockBackend {
    start_programmable_backend(move |_| reply.clone()).await
}

/// Start a mock backend that decides each answer from the request.
pub async fn start_programmable_backend<F>(responder: F) -> MockBackend
where
    F: Fn(&Captured) -> MockReply + Send + Sync + 'static,
{
    let state = Arc::new(BackendState {
        responder: Box::new(responder),
        captured: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(record).with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, state }
}

async fn record(State(state): State<Arc<BackendState>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let captured = Captured {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };

    let reply = (state.responder)(&captured);
    state.captured.lock().unwrap().push(captured);

    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    if let Some(content_type) = reply.content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

/// An address nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Relay config pointing at `origin`, metrics off.
pub fn relay_config(origin: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.origin = origin.to_string();
    config.observability.metrics_enabled = false;
    config
}

/// A running relay.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<RelayConfig>,
}

impl TestRelay {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_relay(config: RelayConfig) -> TestRelay {
    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestRelay {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}
