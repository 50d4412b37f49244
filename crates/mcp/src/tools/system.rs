// System tools: version, services, events, templates, error log and restart

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_free_object, json_schema_object, json_schema_string, parse_args, respond, Tool,
    ToolTier,
};
use anyhow::Result;
use hassbridge_core::error_log;
use hassbridge_sdk::HassClient;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

/// Report the running Home Assistant version.
pub struct GetVersionTool {
    client: Arc<HassClient>,
}

impl GetVersionTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetVersionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_version".to_string(),
            description: "Get the Home Assistant version".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        match self.client.config().version().await {
            Ok(version) => Ok(CallToolResult::text(version)),
            Err(e) => respond::<()>("get_version", Err(e)),
        }
    }
}

/// Restart Home Assistant.
pub struct RestartTool {
    client: Arc<HassClient>,
}

impl RestartTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for RestartTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "restart_ha".to_string(),
            description: "Restart Home Assistant. Makes the instance unavailable for a short \
                time; use with care."
                .to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let result = self.client.system().restart().await.map(|_| {
            json!({
                "result": "ok",
                "message": "Restart initiated"
            })
        });
        respond("restart_ha", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier2
    }
}

/// Call any service.
pub struct CallServiceTool {
    client: Arc<HassClient>,
}

impl CallServiceTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct CallServiceArgs {
    domain: String,
    service: String,
    #[serde(default)]
    data: Option<Value>,
}

#[async_trait::async_trait]
impl Tool for CallServiceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "call_service".to_string(),
            description: "Call any Home Assistant service, e.g. light.turn_on with \
                {\"entity_id\": \"light.kitchen\", \"brightness\": 255}, or \
                automation.trigger with {\"entity_id\": \"automation.morning\"}."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "domain": json_schema_string("Service domain, e.g. light"),
                    "service": json_schema_string("Service name, e.g. turn_on"),
                    "data": json_schema_free_object("Optional service data")
                }),
                vec!["domain", "service"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: CallServiceArgs = parse_args("call_service", arguments)?;
        let result = self
            .client
            .services()
            .call(&args.domain, &args.service, args.data.as_ref())
            .await;
        respond("call_service", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}

/// Fetch and analyze the error log.
pub struct GetErrorLogTool {
    client: Arc<HassClient>,
}

impl GetErrorLogTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetErrorLogTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_error_log".to_string(),
            description: "Get the Home Assistant error log with counts of ERROR and WARNING \
                lines and how often each [integration] is mentioned."
                .to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        info!("Fetching error log");
        let result = self.client.system().error_log().await;
        respond("get_error_log", result.map(error_log::analyze))
    }
}

/// Render a template server side.
pub struct RenderTemplateTool {
    client: Arc<HassClient>,
}

impl RenderTemplateTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct RenderTemplateArgs {
    template: String,
    #[serde(default)]
    variables: Option<Map<String, Value>>,
}

#[async_trait::async_trait]
impl Tool for RenderTemplateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "render_template".to_string(),
            description: "Render a Jinja template on the Home Assistant server, e.g. \
                \"{{ states('sensor.outdoor_temperature') }}\". Returns the rendered text."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "template": json_schema_string("Template to render"),
                    "variables": json_schema_free_object("Optional variables available to the template")
                }),
                vec!["template"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: RenderTemplateArgs = parse_args("render_template", arguments)?;
        match self
            .client
            .system()
            .render_template(&args.template, args.variables.as_ref())
            .await
        {
            Ok(rendered) => Ok(CallToolResult::text(rendered)),
            Err(e) => respond::<()>("render_template", Err(e)),
        }
    }
}

/// Fire a custom event.
pub struct FireEventTool {
    client: Arc<HassClient>,
}

impl FireEventTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct FireEventArgs {
    event_type: String,
    #[serde(default)]
    data: Option<Value>,
}

#[async_trait::async_trait]
impl Tool for FireEventTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "fire_event".to_string(),
            description: "Fire a custom event on the Home Assistant event bus. Automations \
                with an event trigger can react to it."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "event_type": json_schema_string("Event type, e.g. my_custom_event"),
                    "data": json_schema_free_object("Optional event data")
                }),
                vec!["event_type"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: FireEventArgs = parse_args("fire_event", arguments)?;
        let result = self
            .client
            .events()
            .fire(&args.event_type, args.data.as_ref())
            .await;
        respond("fire_event", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}

/// Run the configuration check.
pub struct CheckConfigTool {
    client: Arc<HassClient>,
}

impl CheckConfigTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for CheckConfigTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "check_config".to_string(),
            description: "Validate the Home Assistant configuration files. Worth running \
                before restart_ha."
                .to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let result = self.client.config().check().await;
        respond("check_config", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_client;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_version_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "2025.3.1"})))
            .mount(&server)
            .await;

        let result = GetVersionTool::new(test_client(&server.uri()))
            .execute(Value::Null)
            .await
            .unwrap();
        assert_eq!(result.first_text(), Some("2025.3.1"));
    }

    #[tokio::test]
    async fn test_get_version_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
            .mount(&server)
            .await;

        let result = GetVersionTool::new(test_client(&server.uri()))
            .execute(Value::Null)
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body["error"]["kind"], "not_authorized");
    }

    #[tokio::test]
    async fn test_call_service_forwards_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/services/script/turn_on"))
            .and(body_json(json!({"entity_id": "script.goodnight"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let result = CallServiceTool::new(test_client(&server.uri()))
            .execute(json!({
                "domain": "script",
                "service": "turn_on",
                "data": {"entity_id": "script.goodnight"}
            }))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
    }

    #[tokio::test]
    async fn test_call_service_requires_domain() {
        let tool = CallServiceTool::new(test_client("http://127.0.0.1:9"));
        assert!(tool.execute(json!({"service": "turn_on"})).await.is_err());
    }

    #[tokio::test]
    async fn test_error_log_is_analyzed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/error_log"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "2025-01-01 ERROR (MainThread) [homeassistant.components.hue] Bridge gone\n\
                 2025-01-01 WARNING (MainThread) [homeassistant.components.hue] Retrying\n",
            ))
            .mount(&server)
            .await;

        let result = GetErrorLogTool::new(test_client(&server.uri()))
            .execute(Value::Null)
            .await
            .unwrap();
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body["error_count"], 1);
        assert_eq!(body["warning_count"], 1);
    }

    #[tokio::test]
    async fn test_render_template_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/template"))
            .respond_with(ResponseTemplate::new(200).set_body_string("21.5"))
            .mount(&server)
            .await;

        let result = RenderTemplateTool::new(test_client(&server.uri()))
            .execute(json!({"template": "{{ states('sensor.t') }}"}))
            .await
            .unwrap();
        assert_eq!(result.first_text(), Some("21.5"));
    }

    #[tokio::test]
    async fn test_restart_is_destructive() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/services/homeassistant/restart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let tool = RestartTool::new(test_client(&server.uri()));
        assert_eq!(tool.tier(), ToolTier::Tier2);
        let result = tool.execute(Value::Null).await.unwrap();
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body["result"], "ok");
    }
}
