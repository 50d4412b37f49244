use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod middleware;

use config::{AppState, Overrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "hassbridge")]
#[command(about = "Home Assistant MCP bridge over HTTP", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "hassbridge.toml")]
    config: PathBuf,

    /// Home Assistant base URL
    #[arg(long, env = "HA_URL")]
    ha_url: Option<String>,

    /// Home Assistant long-lived access token
    #[arg(long, env = "HA_TOKEN", hide_env_values = true)]
    ha_token: Option<String>,

    /// Timeout for Home Assistant requests, in seconds
    #[arg(long, env = "HA_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Port to listen on
    #[arg(short, long, env = "API_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "API_HOST")]
    host: Option<String>,

    /// Bearer key required on /mcp
    #[arg(long, env = "HASSBRIDGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            ha_url: self.ha_url.clone(),
            ha_token: self.ha_token.clone(),
            timeout_secs: self.timeout_secs,
            host: self.host.clone(),
            port: self.port,
            api_key: self.api_key.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let settings = ServerConfig::load(&args.config)?.resolve(args.overrides())?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "hassbridge={level},hassbridge_mcp={level},hassbridge_sdk={level},tower_http={level}",
                    level = settings.log_level
                )
                .into()
            }),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    tracing::info!("Starting hassbridge");
    tracing::info!("Home Assistant: {}", settings.ha_url);
    if settings.api_key.is_none() {
        tracing::warn!("No API key configured; /mcp is open to anyone who can reach it");
    }

    let state = AppState::new(&settings)?;

    // Start API server
    let addr = settings.addr();
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, state).await?;

    Ok(())
}
