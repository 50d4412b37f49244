pub mod components;
pub mod dashboards;
pub mod entities;
pub mod history;
pub mod system;
mod registry;

pub use components::{ConfigureComponentTool, DeleteComponentTool, ListAutomationsTool};
pub use dashboards::{ListDashboardsTool, ManageDashboardTool};
pub use entities::{
    DomainSummaryTool, EntityActionTool, GetEntityTool, ListEntitiesTool, SearchEntitiesTool,
    SetAttributesTool, SystemOverviewTool,
};
pub use history::{GetHistoryTool, GetLogbookTool};
pub use registry::{
    error_result, hass_error_result, invalid_input, json_result, json_schema_array,
    json_schema_boolean, json_schema_enum, json_schema_free_object, json_schema_integer,
    json_schema_object, json_schema_string, parse_args, respond, Tool, ToolRegistry, ToolTier,
};
pub use system::{
    CallServiceTool, CheckConfigTool, FireEventTool, GetErrorLogTool, GetVersionTool,
    RenderTemplateTool, RestartTool,
};

use hassbridge_sdk::HassClient;
use std::sync::Arc;

/// Registry with every Home Assistant tool, sharing one client.
pub fn default_registry(client: Arc<HassClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Tier 0: queries
    registry.register(Arc::new(GetVersionTool::new(client.clone())));
    registry.register(Arc::new(GetEntityTool::new(client.clone())));
    registry.register(Arc::new(ListEntitiesTool::new(client.clone())));
    registry.register(Arc::new(SearchEntitiesTool::new(client.clone())));
    registry.register(Arc::new(DomainSummaryTool::new(client.clone())));
    registry.register(Arc::new(SystemOverviewTool::new(client.clone())));
    registry.register(Arc::new(ListAutomationsTool::new(client.clone())));
    registry.register(Arc::new(GetHistoryTool::new(client.clone())));
    registry.register(Arc::new(GetLogbookTool::new(client.clone())));
    registry.register(Arc::new(GetErrorLogTool::new(client.clone())));
    registry.register(Arc::new(RenderTemplateTool::new(client.clone())));
    registry.register(Arc::new(CheckConfigTool::new(client.clone())));
    registry.register(Arc::new(ListDashboardsTool::new(client.clone())));

    // Tier 1: device control and configuration
    registry.register(Arc::new(EntityActionTool::new(client.clone())));
    registry.register(Arc::new(SetAttributesTool::new(client.clone())));
    registry.register(Arc::new(CallServiceTool::new(client.clone())));
    registry.register(Arc::new(FireEventTool::new(client.clone())));
    registry.register(Arc::new(ConfigureComponentTool::new(client.clone())));

    // Tier 2: deletes and restarts
    registry.register(Arc::new(DeleteComponentTool::new(client.clone())));
    registry.register(Arc::new(ManageDashboardTool::new(client.clone())));
    registry.register(Arc::new(RestartTool::new(client)));

    registry
}

#[cfg(test)]
pub(crate) fn test_client(uri: &str) -> Arc<HassClient> {
    Arc::new(
        HassClient::builder()
            .base_url(uri)
            .token("test-token")
            .build()
            .unwrap(),
    )
}
