// Lovelace dashboard tools

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    invalid_input, json_schema_array, json_schema_boolean, json_schema_enum,
    json_schema_free_object, json_schema_object, json_schema_string, parse_args, respond, Tool,
    ToolTier,
};
use anyhow::Result;
use hassbridge_sdk::{DashboardAction, DashboardRequest, HassClient};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// List registered dashboards.
pub struct ListDashboardsTool {
    client: Arc<HassClient>,
}

impl ListDashboardsTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for ListDashboardsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_dashboards".to_string(),
            description: "List the registered Lovelace dashboards (url_path, title, icon, \
                mode). The default dashboard is not listed."
                .to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let result = self.client.dashboards().list().await;
        respond("list_dashboards", result)
    }
}

/// Create, update, delete or read a dashboard.
pub struct ManageDashboardTool {
    client: Arc<HassClient>,
}

impl ManageDashboardTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ManageDashboardArgs {
    action: String,
    #[serde(flatten)]
    request: DashboardRequest,
}

#[async_trait::async_trait]
impl Tool for ManageDashboardTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "manage_dashboard".to_string(),
            description: "Manage Lovelace dashboards. \
                create: needs title; views and resources optional, dashboard_id derived from \
                the title when omitted. \
                update: either a full config document, or title/views/resources merged into \
                the stored one (resources de-duplicated by url). \
                delete: needs dashboard_id. \
                get: returns the stored document; omit dashboard_id for the default dashboard. \
                The tool is annotated destructive because of delete; get never modifies anything."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum(&["create", "update", "delete", "get"], "Operation to perform"),
                    "dashboard_id": json_schema_string("Dashboard url_path, e.g. dashboard-energy"),
                    "config": json_schema_free_object("Complete dashboard document (update)"),
                    "title": json_schema_string("Dashboard title"),
                    "icon": json_schema_string("Sidebar icon, e.g. mdi:flash"),
                    "show_in_sidebar": json_schema_boolean("Show the dashboard in the sidebar (default: true)"),
                    "views": json_schema_array(json!({"type": "object"}), "Ordered view documents with their cards"),
                    "resources": json_schema_array(json!({"type": "object"}), "Front-end resources, e.g. [{\"url\": \"/local/card.js\", \"type\": \"module\"}]")
                }),
                vec!["action"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ManageDashboardArgs = parse_args("manage_dashboard", arguments)?;
        let action: DashboardAction = match args.action.parse() {
            Ok(action) => action,
            Err(e) => return Ok(invalid_input("manage_dashboard", e)),
        };
        info!(action = action.as_str(), dashboard = ?args.request.id(), "manage_dashboard");

        let result = self.client.dashboards().manage(action, &args.request).await;
        respond("manage_dashboard", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier2
    }
}
