//! Command-Payload Gateway
//!
//! An authenticated HTTP gateway that forwards command/payload pairs to a
//! classification backend over raw TCP.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │              PAYLOAD GATEWAY                  │
//!                    │                                               │
//!   Client Request   │  ┌────────┐    ┌─────────┐    ┌───────────┐  │
//!   ─────────────────┼─▶│  http  │───▶│ gateway │───▶│ connector │──┼──▶ Classification
//!                    │  │ server │    │ handler │    │ (TCP dial │  │    Backend
//!   Client Response  │  │        │◀───│         │◀───│ per call) │◀─┼───
//!   ◀────────────────┼──└────────┘    └────┬────┘    └───────────┘  │
//!                    │                     │                        │
//!                    │              ┌──────┴──────┐                 │
//!                    │              │ auth  store │                 │
//!                    │              └─────────────┘                 │
//!                    │  ┌─────────────────────────────────────────┐ │
//!                    │  │        Cross-Cutting Concerns            │ │
//!                    │  │  config · health · observability ·      │ │
//!                    │  │  lifecycle                               │ │
//!                    │  └─────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use payload_gateway::config;
use payload_gateway::http::HttpServer;
use payload_gateway::lifecycle::{self, Shutdown};
use payload_gateway::observability::metrics;
use payload_gateway::store::PgCredentialStore;

#[derive(Debug, Parser)]
#[command(name = "payload-gateway", about = "Authenticated command/payload forwarding gateway")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load_config(&args.config)?;

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("payload-gateway v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    // Initialize metrics endpoint
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Connect the credential store
    let store = Arc::new(
        PgCredentialStore::connect(&config.database.url, config.database.max_connections).await?,
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    // Wire shutdown: signal → broadcast → server drain + monitor exit
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        shutdown.trigger();
    });

    // Create and run HTTP server
    let server = HttpServer::new(config, store);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
