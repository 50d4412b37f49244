// MCP (Model Context Protocol) server exposing Home Assistant to agent clients

pub mod config;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use config::BridgeConfig;
pub use server::McpServer;

use hassbridge_sdk::HassClient;
use std::sync::Arc;

/// Server with every tool, resource and prompt, backed by one client.
pub fn build_server(client: HassClient) -> McpServer {
    let client = Arc::new(client);
    McpServer::new(tools::default_registry(client.clone()), client)
}
