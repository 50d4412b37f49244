// Stdio MCP server binary

use anyhow::Result;
use hassbridge_mcp::{build_server, BridgeConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = BridgeConfig::from_env()?;

    // stdout carries JSON-RPC, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(ha_url = %config.ha_url, "Hass-MCP starting...");

    let server = build_server(config.client()?);
    tracing::info!("Registered {} tools", server.registry().len());

    server.start().await
}
