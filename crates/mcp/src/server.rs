// MCP server: JSON-RPC dispatch shared by the stdio and HTTP transports

use crate::prompts::PromptCatalog;
use crate::protocol::*;
use crate::resources::ResourceProvider;
use crate::tools::{error_result, ToolRegistry};
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use hassbridge_sdk::{ErrorKind, HassClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "Hass-MCP";

/// Longest accepted stdio message.
const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

pub struct McpServer {
    registry: ToolRegistry,
    resources: ResourceProvider,
    prompts: PromptCatalog,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, client: Arc<HassClient>) -> Self {
        Self {
            registry,
            resources: ResourceProvider::new(client),
            prompts: PromptCatalog,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve JSON-RPC over stdin/stdout, one message per line, until stdin closes.
    pub async fn start(&self) -> Result<()> {
        info!(tools = self.registry.len(), "MCP server listening on stdio");

        let mut reader = FramedRead::new(
            tokio::io::stdin(),
            LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        );
        let mut writer = FramedWrite::new(tokio::io::stdout(), LinesCodec::new());

        while let Some(line) = reader.next().await {
            let line = match line {
                Ok(line) => line,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!(max = MAX_LINE_LENGTH, "Dropping oversized message");
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::parse_error("message too long"),
                    );
                    writer.send(serde_json::to_string(&response)?).await?;
                    continue;
                }
                Err(LinesCodecError::Io(e)) => {
                    return Err(e).context("Failed to read from stdin");
                }
            };

            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                writer
                    .send(response)
                    .await
                    .context("Failed to write to stdout")?;
            }
        }

        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle one raw message. `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message).await?,
            Err(e) => {
                warn!(error = %e, "Unparseable message");
                to_value(&JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e)))
            }
        };
        Some(response.to_string())
    }

    /// Handle one decoded message. `None` for notifications.
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let id = message.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Malformed request");
                return Some(to_value(&JsonRpcResponse::error(
                    id.unwrap_or(Value::Null),
                    JsonRpcError::invalid_request(),
                )));
            }
        };

        self.handle_request(request).await.map(|r| to_value(&r))
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        debug!(method = %request.method, "Request");
        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => result(&self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => result(&ListToolsResult {
                tools: self.registry.list_schemas(),
            }),
            "tools/call" => {
                let params: CallToolParams = params_of(params)?;
                result(&self.call_tool(params).await?)
            }
            "resources/list" => result(&ListResourcesResult {
                resources: self.resources.list(),
            }),
            "resources/templates/list" => result(&ListResourceTemplatesResult {
                resource_templates: self.resources.templates(),
            }),
            "resources/read" => {
                let params: ReadResourceParams = params_of(params)?;
                let contents = self
                    .resources
                    .read(&params.uri)
                    .await
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
                result(&contents)
            }
            "prompts/list" => result(&ListPromptsResult {
                prompts: self.prompts.list(),
            }),
            "prompts/get" => {
                let params: GetPromptParams = params_of(params)?;
                let prompt = self
                    .prompts
                    .get(&params.name, params.arguments.as_ref())
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
                result(&prompt)
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChangedCapability {
                    list_changed: false,
                }),
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
                prompts: Some(ListChangedCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult, JsonRpcError> {
        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        info!(tool = %params.name, "Tool call");
        let arguments = params.arguments.unwrap_or(Value::Null);
        match tool.execute(arguments).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool rejected its arguments");
                Ok(error_result(ErrorKind::InvalidInput.as_str(), format!("{e:#}")))
            }
        }
    }
}

fn params_of<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

fn to_value(response: &JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        json!({
            "jsonrpc": "2.0",
            "id": response.id,
            "error": {"code": -32603, "message": e.to_string()}
        })
    })
}
