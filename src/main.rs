//! Locatario gateway (v1)
//!
//! Reverse proxy between the browser frontend and the two upstream REST
//! APIs, built with Tokio, Axum and reqwest.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  GATEWAY                     │
//!   Client Request      │  ┌────────┐   ┌──────────┐   ┌───────────┐   │
//!   ────────────────────┼─▶│  http  │──▶│ reshape  │──▶│ upstream  │───┼──▶ APIDatos
//!                       │  │ server │   │ (table)  │   │  client   │───┼──▶ APICatalogos
//!                       │  └────────┘   └──────────┘   └─────┬─────┘   │
//!   Client Response     │  ┌────────┐                        │         │
//!   ◀───────────────────┼──│ reply  │◀───────────────────────┘         │
//!                       │  └────────┘                                  │
//!                       │  config · logging · metrics · lifecycle      │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use locatario_gateway::config::load_config;
use locatario_gateway::lifecycle::{signals, Shutdown};
use locatario_gateway::observability::{logging, metrics};
use locatario_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "locatario-gateway")]
#[command(about = "Translation gateway for the Locatario data and catalog APIs", long_about = None)]
struct Cli {
    /// Optional TOML configuration file. PORT, APIDatos and APICatalogos
    /// from the environment override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if cli.check {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("locatario-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_url = %config.upstreams.data_url,
        catalog_url = %config.upstreams.catalog_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses when metrics are enabled.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
