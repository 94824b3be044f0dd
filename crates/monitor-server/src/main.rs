//! Oracle price monitor - entry point.

use anyhow::Result;
use clap::Parser;
use monitor_server::{AppConfig, Application, CliOverrides};
use tracing::info;

/// Serves oracle prices derived from the block observer feed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MONITOR_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listener port
    #[arg(long)]
    listener_port: Option<u16>,

    /// Observer write/read deadline in seconds
    #[arg(long)]
    request_timeout_seconds: Option<u64>,

    /// Observer WebSocket URL
    #[arg(long)]
    observer_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    monitor_ws::init_crypto();

    let args = Args::parse();
    monitor_telemetry::init_logging()?;

    info!("Starting price monitor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(args.config)?;
    config.apply_overrides(&CliOverrides {
        listener_port: args.listener_port,
        request_timeout_seconds: args.request_timeout_seconds,
        observer_url: args.observer_url,
    });
    info!(
        listener_port = config.listener_port,
        observer_url = %config.observer_url,
        request_timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    Application::new(config)?.run().await?;

    Ok(())
}
