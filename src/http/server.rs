//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay and admin handlers
//! - Wire up middleware (CORS headers, body limit, timeout, request ID, tracing)
//! - Bind server to listener, plain or TLS
//! - Apply configuration reloads without dropping connections
//! - Graceful shutdown on the broadcast signal

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderName, HeaderValue,
    },
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::admin::setup_admin_router;
use crate::config::RelayConfig;
use crate::http::relay::{preflight_handler, relay_handler};
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN};
use crate::net::tls::load_tls_config;
use crate::relay::UpstreamClient;

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream origin `{origin}`: {source}")]
    Origin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything a relayed request needs, swapped as a unit on reload.
#[derive(Debug)]
pub struct RelayState {
    pub config: RelayConfig,
    pub origin: Url,
    pub upstream: UpstreamClient,
}

impl RelayState {
    pub fn from_config(config: RelayConfig) -> Result<Self, ServerError> {
        let origin = Url::parse(&config.upstream.origin).map_err(|source| ServerError::Origin {
            origin: config.upstream.origin.clone(),
            source,
        })?;
        let upstream = UpstreamClient::new(&config.timeouts)?;
        Ok(Self {
            config,
            origin,
            upstream,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RelayState>>,
    /// Fixed at startup; routes are built from it.
    pub mount_path: Arc<str>,
    pub request_count: Arc<AtomicU64>,
    pub failure_count: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(relay: RelayState) -> Self {
        let mount_path = Arc::from(relay.config.relay.mount_path.as_str());
        Self {
            inner: Arc::new(ArcSwap::from_pointee(relay)),
            mount_path,
            request_count: Arc::new(AtomicU64::new(0)),
            failure_count: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let state = AppState::new(RelayState::from_config(config.clone())?);
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, config, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let mount = config.relay.mount_path.as_str();
        let relay_methods = || {
            get(relay_handler)
                .post(relay_handler)
                .put(relay_handler)
                .delete(relay_handler)
                .options(preflight_handler)
        };

        let relay_routes = Router::new()
            .route(mount, relay_methods())
            .route(&format!("{mount}/{{*suffix}}"), relay_methods())
            .with_state(state.clone())
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_header(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN))
            .layer(cors_header(ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS))
            .layer(cors_header(ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS));

        let mut router = Router::new().merge(relay_routes);
        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        router
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// The fully layered router; useful for driving the relay in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates arriving on `config_updates` replace the relay
    /// state in place. The server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.state.mount_path,
            upstream = %self.config.upstream.origin,
            tls = self.config.listener.tls.is_some(),
            "HTTP server starting"
        );

        tokio::spawn(apply_config_updates(
            self.state.clone(),
            self.config.clone(),
            config_updates,
        ));

        match &self.config.listener.tls {
            None => {
                axum::serve(listener, self.router.into_make_service())
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                        tracing::info!("Shutdown signal received");
                    })
                    .await?;
            }
            Some(tls) => {
                let rustls = load_tls_config(tls.cert_path.as_ref(), tls.key_path.as_ref()).await?;
                let handle = axum_server::Handle::new();
                let grace = Duration::from_secs(self.config.listener.shutdown_grace_secs);

                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!("Shutdown signal received");
                    shutdown_handle.graceful_shutdown(Some(grace));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

fn cors_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Swap in the relay state built from each new configuration.
///
/// The listener and the mount path are fixed for the life of the process.
async fn apply_config_updates(
    state: AppState,
    startup: RelayConfig,
    mut updates: mpsc::UnboundedReceiver<RelayConfig>,
) {
    while let Some(config) = updates.recv().await {
        if config.listener != startup.listener || config.relay.mount_path != startup.relay.mount_path {
            tracing::warn!("Listener and relay.mount_path changes take effect after a restart");
        }
        if config.admin.enabled != startup.admin.enabled || config.security != startup.security {
            tracing::warn!("admin.enabled and security changes take effect after a restart");
        }

        let origin = config.upstream.origin.clone();
        let policy = config.relay.on_missing_target;
        match RelayState::from_config(config) {
            Ok(next) => {
                state.inner.store(Arc::new(next));
                tracing::info!(upstream = %origin, on_missing_target = %policy, "Configuration reloaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected configuration update, keeping current state");
            }
        }
    }
}
