// Entity tools: state lookup, listing, search, summaries and control

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    invalid_input, json_result, json_schema_array, json_schema_boolean, json_schema_enum,
    json_schema_free_object, json_schema_integer, json_schema_object, json_schema_string,
    parse_args, respond, Tool, ToolTier,
};
use anyhow::Result;
use hassbridge_core::analytics::{
    self, EntityQuery, DEFAULT_EXAMPLE_LIMIT, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT,
};
use hassbridge_core::filter::View;
use hassbridge_sdk::{EntityId, HassClient, HassError};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

fn fields_schema() -> Value {
    json_schema_array(
        json_schema_string("state, attributes, attr.<name>, context, last_updated or last_changed"),
        "Fields to include, e.g. [\"state\", \"attr.brightness\"]",
    )
}

/// Get the state of one entity, lean by default.
pub struct GetEntityTool {
    client: Arc<HassClient>,
}

impl GetEntityTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetEntityArgs {
    entity_id: String,
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    detailed: bool,
}

#[async_trait::async_trait]
impl Tool for GetEntityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_entity".to_string(),
            description: "Get the state of a Home Assistant entity. Returns a lean view (state, \
                friendly name, key attributes) unless specific fields or detailed=true are requested."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "entity_id": json_schema_string("Entity to get, e.g. light.living_room"),
                    "fields": fields_schema(),
                    "detailed": json_schema_boolean("Return every field without filtering (default: false)")
                }),
                vec!["entity_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: GetEntityArgs = parse_args("get_entity", arguments)?;
        let entity_id = match EntityId::parse(&args.entity_id) {
            Ok(id) => id,
            Err(e) => return Ok(invalid_input("get_entity", e)),
        };
        info!(entity_id = %entity_id, detailed = args.detailed, "Getting entity");

        let view = View::select(args.fields.as_deref(), args.detailed);
        let result = self.client.states().get(&entity_id).await;
        respond("get_entity", result.map(|state| view.render(&state)))
    }
}

/// Turn an entity on, off or toggle it.
pub struct EntityActionTool {
    client: Arc<HassClient>,
}

impl EntityActionTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct EntityActionArgs {
    entity_id: String,
    action: String,
    #[serde(default)]
    params: Option<Map<String, Value>>,
    /// Extra service data passed next to the named arguments.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn action_service(action: &str) -> Option<&'static str> {
    match action.trim().to_ascii_lowercase().as_str() {
        "on" => Some("turn_on"),
        "off" => Some("turn_off"),
        "toggle" => Some("toggle"),
        _ => None,
    }
}

#[async_trait::async_trait]
impl Tool for EntityActionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "entity_action".to_string(),
            description: "Perform an action on an entity: on, off or toggle. Extra service data \
                (brightness, temperature, position, ...) goes in params."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "entity_id": json_schema_string("Entity to control, e.g. light.living_room"),
                    "action": json_schema_enum(&["on", "off", "toggle"], "Action to perform"),
                    "params": json_schema_free_object("Additional service data, e.g. {\"brightness\": 255}")
                }),
                vec!["entity_id", "action"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: EntityActionArgs = parse_args("entity_action", arguments)?;
        let entity_id = match EntityId::parse(&args.entity_id) {
            Ok(id) => id,
            Err(e) => return Ok(invalid_input("entity_action", e)),
        };
        let Some(service) = action_service(&args.action) else {
            return Ok(invalid_input(
                "entity_action",
                HassError::InvalidInput(format!(
                    "invalid action '{}': expected on, off or toggle",
                    args.action
                )),
            ));
        };

        let mut data = args.extra;
        data.extend(args.params.unwrap_or_default());
        data.insert("entity_id".to_string(), Value::String(entity_id.to_string()));
        info!(entity_id = %entity_id, service = service, "Entity action");

        let result = self
            .client
            .services()
            .call(entity_id.domain(), service, Some(&Value::Object(data)))
            .await;
        respond("entity_action", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}

/// List entities with optional domain filter and search.
pub struct ListEntitiesTool {
    client: Arc<HassClient>,
}

impl ListEntitiesTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ListEntitiesArgs {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    search_query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    detailed: bool,
}

#[async_trait::async_trait]
impl Tool for ListEntitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_entities".to_string(),
            description: "List entities, optionally filtered by domain and a search term matched \
                against ids, names, states and attributes. Lean format unless fields or \
                detailed=true are given. Prefer domain_summary for overviews of a domain."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "domain": json_schema_string("Domain to filter by, e.g. light, switch, sensor"),
                    "search_query": json_schema_string("Search term; no wildcards, leave empty for all"),
                    "limit": json_schema_integer("Maximum number of entities (default: 100, 0 for no limit)"),
                    "fields": fields_schema(),
                    "detailed": json_schema_boolean("Return every field without filtering (default: false)")
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ListEntitiesArgs = parse_args("list_entities", arguments)?;
        let query = EntityQuery {
            domain: args.domain.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            search: args.search_query,
            limit: Some(args.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
        };
        info!(domain = ?query.domain, search = ?query.search, "Listing entities");

        let view = View::select(args.fields.as_deref(), args.detailed);
        let result = self.client.states().list().await.map(|states| {
            analytics::select(&states, &query)
                .into_iter()
                .map(|state| view.render(state))
                .collect::<Vec<Value>>()
        });
        respond("list_entities", result)
    }
}

/// Search entities and report compact hits.
pub struct SearchEntitiesTool {
    client: Arc<HassClient>,
}

impl SearchEntitiesTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEntitiesArgs {
    #[serde(default)]
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait::async_trait]
impl Tool for SearchEntitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_entities".to_string(),
            description: "Search entities by id, name, state or attribute value. Returns the \
                number of matches, simplified results with one key attribute per domain, and \
                counts per domain. An empty query lists all entities up to the limit."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "query": json_schema_string("Search term, e.g. kitchen"),
                    "limit": json_schema_integer("Maximum number of results (default: 20)")
                }),
                vec!["query"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SearchEntitiesArgs = parse_args("search_entities", arguments)?;
        let limit = args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        info!(query = %args.query, limit = limit, "Searching entities");

        let result = self.client.states().list().await;
        respond(
            "search_entities",
            result.map(|states| analytics::search(&states, &args.query, limit)),
        )
    }
}

/// Summarize the entities of one domain.
pub struct DomainSummaryTool {
    client: Arc<HassClient>,
}

impl DomainSummaryTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DomainSummaryArgs {
    domain: String,
    #[serde(default)]
    example_limit: Option<usize>,
}

#[async_trait::async_trait]
impl Tool for DomainSummaryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "domain_summary".to_string(),
            description: "Summarize a domain: entity count, state distribution, example \
                entities per state and the most common attributes."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "domain": json_schema_string("Domain to summarize, e.g. light"),
                    "example_limit": json_schema_integer("Examples per state (default: 3)")
                }),
                vec!["domain"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: DomainSummaryArgs = parse_args("domain_summary", arguments)?;
        let domain = args.domain.trim().to_string();
        let example_limit = args.example_limit.unwrap_or(DEFAULT_EXAMPLE_LIMIT);
        info!(domain = %domain, "Summarizing domain");

        let result = self.client.states().list().await;
        respond(
            "domain_summary",
            result.map(|states| analytics::summarize_domain(&states, &domain, example_limit)),
        )
    }
}

/// Overview of the whole installation.
pub struct SystemOverviewTool {
    client: Arc<HassClient>,
}

impl SystemOverviewTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for SystemOverviewTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "system_overview".to_string(),
            description: "Overview of the installation: entity totals, counts and state \
                distribution per domain, samples, common attributes, area distribution and the \
                most common domains. A good first call to learn what a home contains."
                .to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        info!("Building system overview");
        let result = self.client.states().list().await;
        respond(
            "system_overview",
            result.map(|states| analytics::system_overview(&states)),
        )
    }
}

/// Change attributes through the domain's control operation.
pub struct SetAttributesTool {
    client: Arc<HassClient>,
}

impl SetAttributesTool {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SetAttributesArgs {
    entity_id: String,
    attributes: Map<String, Value>,
}

#[async_trait::async_trait]
impl Tool for SetAttributesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "set_attributes".to_string(),
            description: "Set attributes of an entity. The service is chosen from the entity's \
                domain and the attributes given (light -> light.turn_on, climate -> \
                set_temperature / set_hvac_mode / ...). Only the named attributes change. \
                Domains without a service table have the attributes merged into their state."
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "entity_id": json_schema_string("Entity to change, e.g. light.living_room"),
                    "attributes": json_schema_free_object("Attributes to set, e.g. {\"brightness\": 150, \"transition\": 1}")
                }),
                vec!["entity_id", "attributes"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SetAttributesArgs = parse_args("set_attributes", arguments)?;
        let entity_id = match EntityId::parse(&args.entity_id) {
            Ok(id) => id,
            Err(e) => return Ok(invalid_input("set_attributes", e)),
        };

        let result = self
            .client
            .entities()
            .set_attributes(&entity_id, &args.attributes)
            .await;
        respond("set_attributes", result)
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Tier1
    }
}
