//! Card session server
//!
//! Usage: cargo run -p cardcrew_web --bin cardcrew-server -- --port 3000

use cardcrew_web::settings::{self, Overrides};
use cardcrew_web::{ServerError, WebServer};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cardcrew-server", version, about = "Cooperative card session server")]
struct Cli {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,
    /// Port to bind (0 picks a free one)
    #[arg(long, short)]
    port: Option<u16>,
    /// TOML settings file, overrides CARDCREW_CONFIG
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Seed for reproducible decks
    #[arg(long)]
    seed: Option<u64>,
    /// Log one JSON object per line
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse();
    if let Err(err) = cardcrew_web::init_logging(cli.json_logs) {
        eprintln!("logging already initialised: {err}");
    }

    let overrides = Overrides {
        config: cli.config,
        host: cli.host,
        port: cli.port,
        seed: cli.seed,
    };
    let resolved = settings::load(&overrides)?;
    tracing::info!(
        host = %resolved.settings.host,
        port = resolved.settings.port,
        seed = ?resolved.settings.seed,
        unique_chip_picks = resolved.settings.unique_chip_picks,
        sources = ?resolved.sources,
        "settings resolved"
    );

    let handle = WebServer::new(resolved.settings.server_config())
        .start()
        .await?;
    println!("Server running at ws://{}/ws (Ctrl+C to stop)", handle.address());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    handle.shutdown().await
}
