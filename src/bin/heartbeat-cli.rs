use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use heartbeat::ratelimit::window::RateLimiterConfig;
use heartbeat::ratelimit::LocalAdmissionController;

#[derive(Parser)]
#[command(name = "heartbeat-cli")]
#[command(about = "Management CLI for the heartbeat services", long_about = None)]
struct Cli {
    /// Base URL of the pong service.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audit records stored by the pong service
    Records,
    /// Send one probe and print the answer
    Probe,
    /// Check pong service status
    Status,
    /// Delete the shared ping rate limiter state file
    Reset {
        #[arg(long, default_value = "ping-rate.data")]
        state_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Records => {
            let res = client.get(format!("{}/api/records", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Probe => {
            let res = client.get(format!("{}/api/pong", cli.url)).send().await?;
            let status = res.status();
            let body = res.text().await?;
            println!("{} {}", status.as_u16(), body);
        }
        Commands::Reset { state_file } => {
            // Limits are irrelevant for deletion.
            let limiter = LocalAdmissionController::new(
                &state_file,
                RateLimiterConfig::new(1, Duration::from_secs(1))?,
                Duration::from_millis(100),
            );
            limiter.cleanup();
            println!("removed {}", state_file.display());
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: pong service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
