//! RPS World - Spawn Server

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rps_core::config::Config;
use rps_server::{Server, ServerConfig};

#[derive(Parser)]
#[command(name = "rps_server")]
#[command(about = "Live rock-paper-scissors world accepting spawn requests over TCP")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// World updates per second
    #[arg(long, default_value = "60")]
    tick_rate: u32,

    /// Spawn requests held before new ones are refused
    #[arg(long, default_value = "1000")]
    queue_capacity: usize,

    /// Agents per kind spawned at startup
    #[arg(short, long)]
    batch: Option<u32>,

    /// RON world config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    tracing::info!("Starting RPS World spawn server");

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Server stopped with an error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> rps_server::Result<()> {
    let mut world_config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(seed) = cli.seed {
        world_config = world_config.with_seed(seed);
    }

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        tick_rate: cli.tick_rate,
        queue_capacity: cli.queue_capacity,
        initial_batch: cli.batch,
        ..ServerConfig::default()
    };

    let server = Server::bind(config, world_config).await?;
    let world = server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Cannot listen for Ctrl-C, stopping");
            }
        })
        .await?;

    tracing::info!(
        tick = world.tick(),
        counts = ?world.counts(),
        winner = ?world.winner_kind(),
        "Final world state"
    );
    Ok(())
}
