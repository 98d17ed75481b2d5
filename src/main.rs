use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use gabay_gateway::config::load_config;
use gabay_gateway::http::{AppState, HttpServer};
use gabay_gateway::lifecycle::{signals, Shutdown};
use gabay_gateway::observability::{logging, metrics};
use gabay_gateway::rate_limit::spawn_sweeper;

#[derive(Debug, Parser)]
#[command(name = "gabay-gateway", version, about = "Internal gateway for the Gabay backend")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("gabay-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        routes = config.rate_limit.routes.len(),
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Every receiver is subscribed before the signal handler can fire.
    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let sweeper_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    let state = AppState::from_config(&config)?;

    let sweeper = if config.rate_limit.enabled {
        Some(spawn_sweeper(
            state.limiter.clone(),
            Duration::from_secs(config.rate_limit.sweep_interval_secs),
            sweeper_shutdown,
        ))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(state, &config.listener);
    server.run(listener, server_shutdown).await?;

    // Stop background tasks if the server exits first.
    shutdown.trigger();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
