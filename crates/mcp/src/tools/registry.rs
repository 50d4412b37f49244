// MCP tool trait, registry and shared helpers

use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use anyhow::{Context, Result};
use hassbridge_sdk::{HassError, HassResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;

    /// Get the tool's tier, surfaced to clients as annotations
    fn tier(&self) -> ToolTier {
        ToolTier::Tier0
    }
}

/// Tool security tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolTier {
    /// Read-only operations
    Tier0,
    /// Controlled writes (device control, configuration changes)
    Tier1,
    /// Dangerous operations (deletes, restarts)
    Tier2,
}

impl ToolTier {
    pub fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            read_only_hint: *self == ToolTier::Tier0,
            destructive_hint: *self == ToolTier::Tier2,
        }
    }
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name, with tier annotations
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| {
                let mut schema = t.schema();
                schema.annotations = Some(t.tier().annotations());
                schema
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> Value {
    json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> Value {
    json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

pub fn json_schema_free_object(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "additionalProperties": true
    })
}

// Helper functions for executing tools

/// Deserialize tool arguments; `null` counts as no arguments.
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {}", tool))
}

/// Pretty JSON text result.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize tool result")?;
    Ok(CallToolResult::text(text))
}

/// Structured error result: `{"error": {"kind": ..., "message": ...}}`.
pub fn error_result(kind: &str, message: impl std::fmt::Display) -> CallToolResult {
    let body = json!({
        "error": {
            "kind": kind,
            "message": message.to_string(),
        }
    });
    CallToolResult::error(body.to_string())
}

pub fn hass_error_result(tool: &str, err: &HassError) -> CallToolResult {
    warn!(tool = tool, kind = %err.kind(), error = %err, "Tool call failed");
    error_result(err.kind().as_str(), err)
}

/// Arguments rejected locally, reported with the same kinds as client errors.
pub fn invalid_input(tool: &str, err: impl Into<HassError>) -> CallToolResult {
    hass_error_result(tool, &err.into())
}

/// Render a client result as JSON text or a structured error.
pub fn respond<T: Serialize>(tool: &str, result: HassResult<T>) -> Result<CallToolResult> {
    match result {
        Ok(value) => json_result(&value),
        Err(err) => Ok(hass_error_result(tool, &err)),
    }
}
