//! Pong service: answers probes under an in-process rate limit and stores the
//! audit records relayed by ping processes.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use heartbeat::config::{load_or_default, PongConfig};
use heartbeat::lifecycle::{build_pong, wait_for_signal, Shutdown};
use heartbeat::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "pong")]
#[command(about = "Answer heartbeat probes and store audit records", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config: PongConfig = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("pong v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit = config.rate_limit.rate_limit,
        window_ms = config.rate_limit.window_ms,
        records = ?config.records.path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = build_pong(&config)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let serve = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    serve.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
