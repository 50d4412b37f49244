// Component tools: automations, scripts, scenes and dashboard configurations

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    invalid_input, json_schema_boolean, json_schema_enum, json_schema_free_object,
    json_schema_object, json_schema_string, parse_args, respond, Tool, ToolTier,
};
use anyhow::Result;
use hassbridge_core::analytics;
use hassbridge_core::CoreResult;
use hassbridge_sdk::{ComponentKind, ComponentRef, HassClient};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const COMPONENT_TYPES: &[&str] = &["automation", "script", "scene", "dashboard"];

fn component_ref(component_type: &str, object_id: &str) -> CoreResult<ComponentRef> {
    let kind: ComponentKind = component_type.parse()?;
    ComponentRef::new(kind, object_id.trim())
}

/// List automations with their current state.
pub struct ListAutomationsTool {
    client: Arc<HassClient>,
}

impl ListAutomationsTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for ListAutomationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_automations".to_string(),
            description: "List automations with id, entity_id, state (on/off), alias and \
                when they last triggered."
                .to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let result = self.client.states().list().await;
        respond(
            "list_automations",
            result.map(|states| analytics::automations(&states)),
        )
    }
}

/// Create, replace or merge-update a component configuration.
pub struct ConfigureComponentTool {
    client: Arc<HassClient>,
}

impl ConfigureComponentTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigureComponentArgs {
    component_type: String,
    object_id: String,
    config_data: Value,
    #[serde(default)]
    update: bool,
}

#[async_trait::async_trait]
impl Tool for ConfigureComponentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "configure_component".to_string(),
            description: "Create or replace the configuration of an automation, script, scene \
                or dashboard. With update=true the given keys are merged over the stored \
                configuration. Automations, scripts and scenes are reloaded afterwards. \
                Example automation: {\"alias\": \"Lights at sunset\", \"trigger\": \
                [{\"platform\": \"sun\", \"event\": \"sunset\"}], \"action\": \
                [{\"service\": \"light.turn_on\", \"target\": {\"entity_id\": \"light.porch\"}}]}"
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "component_type": json_schema_enum(COMPONENT_TYPES, "Kind of component"),
                    "object_id": json_schema_string("Identifier of the component, e.g. sunset_lights"),
                    "config_data": json_schema_free_object("Configuration document"),
                    "update": json_schema_boolean("Merge into the existing configuration instead of replacing it (default: false)")
                }),
                vec!["component_type", "object_id", "config_data"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ConfigureComponentArgs = parse_args("configure_component", arguments)?;
        let component = match component_ref(&args.component_type, &args.object_id) {
            Ok(component) => component,
            Err(e) => return Ok(invalid_input("configure_component", e)),
        };
        info!(component = %component, update = args.update, "configure_component");

        let result = self
            .client
            .components()
            .configure(&component, &args.config_data, args.update)
            .await;
        respond("configure_component", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}

/// Delete a component configuration.
pub struct DeleteComponentTool {
    client: Arc<HassClient>,
}

impl DeleteComponentTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteComponentArgs {
    component_type: String,
    object_id: String,
}

#[async_trait::async_trait]
impl Tool for DeleteComponentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_component".to_string(),
            description: "Delete an automation, script, scene or dashboard configuration. \
                Deleting a component that does not exist succeeds with deleted=false."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "component_type": json_schema_enum(COMPONENT_TYPES, "Kind of component"),
                    "object_id": json_schema_string("Identifier of the component")
                }),
                vec!["component_type", "object_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: DeleteComponentArgs = parse_args("delete_component", arguments)?;
        let component = match component_ref(&args.component_type, &args.object_id) {
            Ok(component) => component,
            Err(e) => return Ok(invalid_input("delete_component", e)),
        };

        let result = self.client.components().delete(&component).await;
        respond("delete_component", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_client;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn body(result: &CallToolResult) -> Value {
        serde_json::from_str(result.first_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_configure_then_read_back() {
        let server = MockServer::start().await;
        let config = json!({
            "alias": "Lights at sunset",
            "trigger": [{"platform": "sun", "event": "sunset"}],
            "action": [{"service": "light.turn_on", "target": {"entity_id": "light.porch"}}]
        });
        Mock::given(method("POST"))
            .and(path("/api/config/automation/config/sunset_lights"))
            .and(body_json(config.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/services/automation/reload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let result = ConfigureComponentTool::new(test_client(&server.uri()))
            .execute(json!({
                "component_type": "automation",
                "object_id": "sunset_lights",
                "config_data": config
            }))
            .await
            .unwrap();
        let outcome = body(&result);
        assert_eq!(outcome["result"], "ok");
        assert_eq!(outcome["component_type"], "automation");
        assert_eq!(outcome["reloaded"], true);
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_arguments() {
        let tool = ConfigureComponentTool::new(test_client("http://127.0.0.1:9"));

        let unknown = tool
            .execute(json!({"component_type": "blueprint", "object_id": "x", "config_data": {}}))
            .await
            .unwrap();
        assert_eq!(body(&unknown)["error"]["kind"], "invalid_input");

        let empty = tool
            .execute(json!({"component_type": "script", "object_id": " ", "config_data": {}}))
            .await
            .unwrap();
        assert_eq!(empty.is_error, Some(true));

        let not_object = tool
            .execute(json!({"component_type": "scene", "object_id": "movie", "config_data": [1]}))
            .await
            .unwrap();
        assert_eq!(body(&not_object)["error"]["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_configure_upstream_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/config/script/config/broken"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Message malformed"})),
            )
            .mount(&server)
            .await;

        let result = ConfigureComponentTool::new(test_client(&server.uri()))
            .execute(json!({
                "component_type": "script",
                "object_id": "broken",
                "config_data": {"sequence": "nope"}
            }))
            .await
            .unwrap();
        assert_eq!(body(&result)["error"]["kind"], "upstream_rejected");
    }

    #[tokio::test]
    async fn test_delete_missing_component_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/config/scene/config/never_made"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tool = DeleteComponentTool::new(test_client(&server.uri()));
        assert_eq!(tool.tier(), ToolTier::Tier2);
        let result = tool
            .execute(json!({"component_type": "scene", "object_id": "never_made"}))
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let outcome = body(&result);
        assert_eq!(outcome["result"], "ok");
        assert_eq!(outcome["deleted"], false);
    }

    #[tokio::test]
    async fn test_delete_rejects_path_escaping_ids() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .expect(0)
            .mount(&server)
            .await;

        let tool = DeleteComponentTool::new(test_client(&server.uri()));
        for object_id in ["..", ".", "x?y", "#x", "a\\b", "%2e%2e"] {
            let result = tool
                .execute(json!({"component_type": "automation", "object_id": object_id}))
                .await
                .unwrap();
            assert_eq!(result.is_error, Some(true), "{object_id} was accepted");
            assert_eq!(body(&result)["error"]["kind"], "invalid_input");
        }
    }

    #[tokio::test]
    async fn test_list_automations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/states"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"entity_id": "automation.morning", "state": "on",
                 "attributes": {"id": "1700000000", "friendly_name": "Morning"}},
                {"entity_id": "light.hall", "state": "off", "attributes": {}}
            ])))
            .mount(&server)
            .await;

        let result = ListAutomationsTool::new(test_client(&server.uri()))
            .execute(Value::Null)
            .await
            .unwrap();
        let automations = body(&result);
        assert_eq!(automations.as_array().unwrap().len(), 1);
        assert_eq!(automations[0]["entity_id"], "automation.morning");
    }
}
