//! Garuda Relay
//!
//! A CORS-friendly HTTP relay in front of the Garuda Lands backend.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser                         ┌──────────────────────────────────────┐
//!   ───────────────────────────────▶│  http::server (axum + tower-http)    │
//!   GET  /relay?url=http://b/x      │    request id → trace → CORS headers │
//!   POST /relay/auth/login-user     │    → body limit → timeout            │
//!   OPTIONS /relay/...              │                                      │
//!                                   │  http::relay                         │
//!                                   │    OPTIONS → preflight (local)       │
//!                                   │    else → relay::target → forward ───┼──▶ Backend
//!   ◀───────────────────────────────┤    status + body passed through  ◀───┼─── origin
//!                                   │                                      │
//!                                   │  config (toml, env, cli, hot reload) │
//!                                   │  observability (tracing, prometheus) │
//!                                   └──────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use garuda_relay::config::{self, ConfigWatcher, Overrides};
use garuda_relay::lifecycle::{wait_for_termination, Shutdown};
use garuda_relay::observability::{logging, metrics};
use garuda_relay::HttpServer;

#[derive(Parser)]
#[command(name = "garuda-relay")]
#[command(about = "CORS relay for the Garuda Lands backend", long_about = None)]
struct Args {
    /// TOML configuration file; watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend origin, e.g. http://10.0.0.5 (overrides GARUDA_UPSTREAM_ORIGIN).
    #[arg(long)]
    upstream_origin: Option<String>,

    /// Listen address (overrides GARUDA_BIND_ADDRESS).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = Overrides::from_env().merge(Overrides {
        upstream_origin: args.upstream_origin,
        bind_address: args.bind,
    });
    let config = config::load(args.config.as_deref(), &overrides)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "garuda-relay starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin,
        mount_path = %config.relay.mount_path,
        on_missing_target = %config.relay.on_missing_target,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, overrides.clone());
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (None, updates)
                }
            }
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
