use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use rssify::config::Config;
use rssify::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "rssify", about = "Serve RSS feeds scraped from web pages")]
struct Args {
    /// TOML config file (missing file means defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on; overrides the config file and PORT
    #[arg(long)]
    port: Option<u16>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_env()
        .context("Invalid environment configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    tracing::debug!(?config, "Effective configuration");

    let addr = config.bind_addr();
    let sweep_every = Duration::from_secs(config.cache_ttl_secs.max(1));

    let state = AppState::from_config(config).context("Failed to build HTTP client")?;
    let sweeper = server::spawn_cache_sweeper(state.cache.clone(), sweep_every);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    Ok(())
}
