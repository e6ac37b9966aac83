//! Hostwatch CLI
//!
//! Command-line interface for the host health monitoring service.

use std::path::PathBuf;

use clap::Parser;
use hostwatch::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(about = "Host health monitoring and alert notification service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    tracing::info!("Starting hostwatch service");
    tracing::debug!(
        "Metrics enabled: disk={}, cpu={}, memory={}; notifiers: {}",
        config.disk.enabled,
        config.cpu.enabled,
        config.memory.enabled,
        config.notifications.len()
    );

    hostwatch::run(config).await?;

    Ok(())
}
