// History and logbook tools

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    invalid_input, json_schema_integer, json_schema_object, json_schema_string, parse_args,
    respond, Tool,
};
use anyhow::Result;
use hassbridge_core::history::{self, HistoryOptions, DEFAULT_HISTORY_HOURS};
use hassbridge_sdk::{EntityId, HassClient, HassResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Sampled state history with statistics.
pub struct GetHistoryTool {
    client: Arc<HassClient>,
}

impl GetHistoryTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }

    async fn history(&self, entity_id: &EntityId, hours: u32) -> HassResult<history::HistorySummary> {
        let current = self.client.states().get(entity_id).await?;
        let records = self.client.history().recent(entity_id, hours).await?;
        let options = HistoryOptions {
            hours,
            minimal: true,
        };
        Ok(history::summarize(&current, &records, options))
    }
}

#[derive(Debug, Deserialize)]
struct GetHistoryArgs {
    entity_id: String,
    #[serde(default)]
    hours: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetHistoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_history".to_string(),
            description: "Get the state history of an entity. Long histories are sampled to \
                about 100 points; numeric states come with min/max/avg and, for sensors, \
                the change and trend over the period."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "entity_id": json_schema_string("Entity to get history for, e.g. sensor.outdoor_temperature"),
                    "hours": json_schema_integer("Hours of history to fetch (default: 24)")
                }),
                vec!["entity_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: GetHistoryArgs = parse_args("get_history", arguments)?;
        let entity_id = match EntityId::parse(&args.entity_id) {
            Ok(id) => id,
            Err(e) => return Ok(invalid_input("get_history", e)),
        };
        let hours = args.hours.unwrap_or(DEFAULT_HISTORY_HOURS).max(1);
        info!(entity_id = %entity_id, hours = hours, "Getting history");

        respond("get_history", self.history(&entity_id, hours).await)
    }
}

/// Logbook entries for a time window.
pub struct GetLogbookTool {
    client: Arc<HassClient>,
}

impl GetLogbookTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetLogbookArgs {
    #[serde(default)]
    hours: Option<u32>,
    #[serde(default)]
    entity_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetLogbookTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_logbook".to_string(),
            description: "Get logbook entries (state changes, automation runs, events) for \
                the last N hours, optionally for a single entity."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "hours": json_schema_integer("Hours to look back (default: 24)"),
                    "entity_id": json_schema_string("Only entries for this entity")
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: GetLogbookArgs = parse_args("get_logbook", arguments)?;
        let entity_id = match args.entity_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match EntityId::parse(raw) {
                Ok(id) => Some(id),
                Err(e) => return Ok(invalid_input("get_logbook", e)),
            },
            None => None,
        };
        let hours = args.hours.unwrap_or(DEFAULT_HISTORY_HOURS).max(1);

        let result = self.client.logbook().recent(hours, entity_id.as_ref()).await;
        respond("get_logbook", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_client;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_history_with_statistics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/states/sensor.temp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entity_id": "sensor.temp", "state": "22",
                "attributes": {"unit_of_measurement": "°C"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/api/history/period/.+"))
            .and(query_param("filter_entity_id", "sensor.temp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
                {"state": "20", "last_changed": "2025-01-01T00:00:00+00:00"},
                {"state": "22", "last_changed": "2025-01-01T06:00:00+00:00"}
            ]])))
            .mount(&server)
            .await;

        let result = GetHistoryTool::new(test_client(&server.uri()))
            .execute(json!({"entity_id": "sensor.temp", "hours": 6}))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body["count"], 2);
        assert_eq!(body["statistics"]["min"], 20.0);
        assert_eq!(body["statistics"]["max"], 22.0);
    }

    #[tokio::test]
    async fn test_history_unknown_entity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/states/sensor.ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = GetHistoryTool::new(test_client(&server.uri()))
            .execute(json!({"entity_id": "sensor.ghost"}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_history_window_out_of_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/states/sensor.temp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entity_id": "sensor.temp", "state": "22", "attributes": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/api/history/period/.+"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let result = GetHistoryTool::new(test_client(&server.uri()))
            .execute(json!({"entity_id": "sensor.temp", "hours": u32::MAX}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body["error"]["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_logbook_window_out_of_range() {
        let result = GetLogbookTool::new(test_client("http://127.0.0.1:9"))
            .execute(json!({"hours": u32::MAX}))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body["error"]["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_logbook_for_entity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/api/logbook/.+"))
            .and(query_param("entity_id", "light.kitchen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Kitchen", "message": "turned on", "entity_id": "light.kitchen"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let result = GetLogbookTool::new(test_client(&server.uri()))
            .execute(json!({"entity_id": "light.kitchen", "hours": 2}))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(body[0]["message"], "turned on");
    }
}
