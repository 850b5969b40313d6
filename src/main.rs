//! Health-checked round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                LOAD BALANCER                 │
//!                      │                                              │
//!   Client Request     │  ┌──────────┐    ┌───────────┐               │
//!   ───────────────────┼─▶│  http    │───▶│   pool    │               │
//!                      │  │  server  │    │ + round   │               │
//!                      │  └────┬─────┘    │   robin   │◀──────┐       │
//!                      │       │          └───────────┘       │       │
//!                      │       ▼                              │       │
//!   Client Response    │  ┌──────────┐                 ┌──────┴─────┐ │
//!   ◀──────────────────┼──│  proxy   │◀───────────────▶│  health    │ │
//!                      │  │ forward  │    Backends     │  monitor   │ │
//!                      │  └──────────┘                 └────────────┘ │
//!                      │                                              │
//!                      │  GET /lb/status ─▶ admin (pool snapshot)     │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use lb_proxy::http::HttpServer;
use lb_proxy::lifecycle::{build_config, signals, Cli, Shutdown};
use lb_proxy::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(Cli::parse())?;
    logging::init(&config.observability).map_err(|e| e as Box<dyn std::error::Error>)?;

    tracing::info!("lb-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let addresses: Vec<&str> = config.backends.iter().map(|b| b.address.as_str()).collect();
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = ?addresses,
        health_interval_secs = config.health_check.interval_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => result??,
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
