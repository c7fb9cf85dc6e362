//! Ping service: periodic probe of the pong service under a host-wide rate limit.
//!
//! # Architecture Overview
//!
//! ```text
//!   timer tick ──▶ LocalAdmissionController ──denied──▶ classify ──▶ audit sink
//!                  (locked state file,          │
//!                   shared by all pings)        └─granted─▶ GET /api/pong ──▶ classify ──▶ audit sink
//! ```

use std::path::PathBuf;

use clap::Parser;

use heartbeat::config::{load_or_default, PingConfig};
use heartbeat::lifecycle::{build_ping, wait_for_signal, Shutdown};
use heartbeat::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ping")]
#[command(about = "Periodically probe the pong service", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config: PingConfig = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("ping v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        pong_url = %config.probe.pong_url,
        interval_ms = config.probe.interval_ms,
        rate_limit = config.rate_limit.rate_limit,
        window_ms = config.rate_limit.window_ms,
        state_file = %config.rate_limit.state_file,
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

    let components = build_ping(&config)?;
    let shutdown = Shutdown::new();
    let scheduler = tokio::spawn(components.scheduler.run(shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    let stats = scheduler.await?;
    tracing::info!(ticks = stats.ticks, skipped = stats.skipped, "Scheduler drained");

    if config.rate_limit.cleanup_on_shutdown {
        components.limiter.cleanup();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
