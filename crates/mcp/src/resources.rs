// MCP resources: markdown views of entities under hass:// URIs

use crate::protocol::{ReadResourceResult, Resource, ResourceContents, ResourceTemplate};
use anyhow::{bail, Result};
use hassbridge_core::analytics::{self, EntityQuery, DEFAULT_SEARCH_LIMIT};
use hassbridge_core::{domain_of, EntityState};
use hassbridge_sdk::{EntityId, HassClient};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const SCHEME: &str = "hass://";
const MIME_MARKDOWN: &str = "text/markdown";

/// A parsed `hass://` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRoute {
    AllEntities,
    Entity(String),
    EntityDetailed(String),
    Domain(String),
    Search { query: String, limit: usize },
}

impl ResourceRoute {
    pub fn parse(uri: &str) -> Option<Self> {
        let path = uri.strip_prefix(SCHEME)?.trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').collect();

        match segments.as_slice() {
            ["entities"] => Some(Self::AllEntities),
            ["entities", "domain", domain] if !domain.is_empty() => {
                Some(Self::Domain(domain.to_string()))
            }
            ["entities", entity_id, "detailed"] if !entity_id.is_empty() => {
                Some(Self::EntityDetailed(entity_id.to_string()))
            }
            ["entities", entity_id] if !entity_id.is_empty() => {
                Some(Self::Entity(entity_id.to_string()))
            }
            ["search", query, limit] => Some(Self::Search {
                query: query.to_string(),
                limit: search_limit(limit),
            }),
            _ => None,
        }
    }
}

/// Non-numeric or non-positive limits fall back to the search default.
fn search_limit(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(limit) if limit > 0 => usize::try_from(limit).unwrap_or(DEFAULT_SEARCH_LIMIT),
        _ => DEFAULT_SEARCH_LIMIT,
    }
}

/// Serves the `hass://` resources from live state.
pub struct ResourceProvider {
    client: Arc<HassClient>,
}

impl ResourceProvider {
    pub fn new(client: Arc<HassClient>) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Vec<Resource> {
        vec![Resource {
            uri: format!("{SCHEME}entities"),
            name: "All entities".to_string(),
            description: Some(
                "Every entity grouped by domain. Large on big installations; prefer the \
                 domain or search templates."
                    .to_string(),
            ),
            mime_type: MIME_MARKDOWN.to_string(),
        }]
    }

    pub fn templates(&self) -> Vec<ResourceTemplate> {
        let template = |uri: &str, name: &str, description: &str| ResourceTemplate {
            uri_template: format!("{SCHEME}{uri}"),
            name: name.to_string(),
            description: Some(description.to_string()),
            mime_type: MIME_MARKDOWN.to_string(),
        };

        vec![
            template(
                "entities/{entity_id}",
                "Entity",
                "State, name and key attributes of one entity",
            ),
            template(
                "entities/{entity_id}/detailed",
                "Entity (detailed)",
                "Every attribute and the context of one entity",
            ),
            template(
                "entities/domain/{domain}",
                "Domain entities",
                "All entities of one domain",
            ),
            template(
                "search/{query}/{limit}",
                "Entity search",
                "Entities matching a query, with a JSON summary",
            ),
        ]
    }

    /// Render a resource. Unknown URIs are an error; upstream failures are
    /// rendered into the document.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult> {
        let Some(route) = ResourceRoute::parse(uri) else {
            bail!("Unknown resource: {}", uri);
        };
        info!(uri = uri, "Reading resource");

        let text = match route {
            ResourceRoute::AllEntities => self.all_entities().await,
            ResourceRoute::Entity(entity_id) => self.entity(&entity_id, false).await,
            ResourceRoute::EntityDetailed(entity_id) => self.entity(&entity_id, true).await,
            ResourceRoute::Domain(domain) => self.domain(&domain).await,
            ResourceRoute::Search { query, limit } => self.search(&query, limit).await,
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: MIME_MARKDOWN.to_string(),
                text,
            }],
        })
    }

    async fn entity(&self, raw_id: &str, detailed: bool) -> String {
        let state = match EntityId::parse(raw_id) {
            Ok(entity_id) => self.client.states().get(&entity_id).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match state {
            Ok(state) if detailed => render_entity_detailed(&state),
            Ok(state) => render_entity(&state),
            Err(e) => format!("# Entity: {raw_id}\n\nError retrieving entity: {e}"),
        }
    }

    async fn all_entities(&self) -> String {
        match self.client.states().list().await {
            Ok(states) => render_all_entities(&states),
            Err(e) => format!("Error retrieving entities: {e}"),
        }
    }

    async fn domain(&self, domain: &str) -> String {
        let query = EntityQuery {
            domain: Some(domain.to_string()),
            search: None,
            limit: Some(0),
        };
        match self.client.states().list().await {
            Ok(states) => render_domain(domain, &analytics::select(&states, &query)),
            Err(e) => format!("Error retrieving entities: {e}"),
        }
    }

    async fn search(&self, query: &str, limit: usize) -> String {
        if query.trim().is_empty() {
            return "# Entity Search\n\nError: No search query provided".to_string();
        }
        match self.client.states().list().await {
            Ok(states) => render_search(&analytics::search(&states, query, limit), limit),
            Err(e) => format!("# Entity Search\n\nError retrieving entities: {e}"),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn entity_line(entity_id: &str, state: &str, name: Option<&str>) -> String {
    let mut line = format!("- **[{entity_id}](resource:hass://entities/{entity_id})**: {state}");
    if let Some(name) = name.filter(|n| !n.is_empty() && *n != entity_id) {
        line.push_str(&format!(" ({name})"));
    }
    line.push('\n');
    line
}

fn header(state: &EntityState, title: &str) -> String {
    let mut out = format!("# {title}\n\n");
    if let Some(name) = state.friendly_name().filter(|n| *n != state.entity_id) {
        out.push_str(&format!("**Name**: {name}\n\n"));
    }
    out.push_str(&format!("**State**: {}\n\n", state.state));
    out.push_str(&format!("**Domain**: {}\n\n", state.domain()));
    out
}

pub fn render_entity(state: &EntityState) -> String {
    let entity_id = &state.entity_id;
    let mut out = header(state, &format!("Entity: {entity_id}"));
    out.push_str("## Key Attributes\n\n");

    let mut shown = 0;
    let mut names: Vec<String> = analytics::key_attribute_names(state.domain())
        .into_iter()
        .map(str::to_string)
        .collect();
    if state.domain() == "climate" {
        names.extend(
            state
                .attributes
                .keys()
                .filter(|k| k.starts_with("target_temp_"))
                .cloned(),
        );
    }

    for name in &names {
        let Some(value) = state.attributes.get(name) else {
            continue;
        };
        let rendered = display_value(value);
        if (value.is_array() || value.is_object()) && rendered.len() > 100 {
            out.push_str(&format!("- **{name}**: *[Complex data, see detailed view]*\n"));
        } else {
            out.push_str(&format!("- **{name}**: {rendered}\n"));
        }
        shown += 1;
    }
    if shown == 0 {
        out.push_str("No key attributes found for this entity type.\n");
    }

    let total = state.attributes.len();
    if total > shown {
        out.push_str(&format!(
            "\n**Note**: Showing {shown} of {total} total attributes. {} additional attributes \
             are available in the [detailed view](resource:hass://entities/{entity_id}/detailed).\n",
            total - shown
        ));
    }
    out.push('\n');

    if let Some(updated) = &state.last_updated {
        out.push_str(&format!("**Last Updated**: {updated}\n"));
    }
    out
}

fn related_domains(domain: &str) -> &'static [&'static str] {
    match domain {
        "light" => &["switch", "scene", "automation"],
        "sensor" => &["binary_sensor", "input_number", "utility_meter"],
        "climate" => &["sensor", "switch", "fan"],
        "media_player" => &["remote", "switch", "sensor"],
        _ => &[],
    }
}

pub fn render_entity_detailed(state: &EntityState) -> String {
    let entity_id = &state.entity_id;
    let mut out = header(state, &format!("Entity: {entity_id} (Detailed View)"));

    out.push_str("## Usage Note\n");
    out.push_str(&format!(
        "This is the detailed view showing all entity attributes. For token-efficient \
         interactions, consider using the [standard entity endpoint](resource:hass://entities/{entity_id}) \
         or the get_entity tool with field filtering.\n\n"
    ));

    if !state.attributes.is_empty() {
        out.push_str("## Attributes\n\n");
        let sorted: BTreeMap<&String, &Value> = state.attributes.iter().collect();
        for (name, value) in sorted {
            if value.is_array() || value.is_object() {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                out.push_str(&format!("- **{name}**:\n```json\n{pretty}\n```\n"));
            } else {
                out.push_str(&format!("- **{name}**: {}\n", display_value(value)));
            }
        }
        out.push('\n');
    }

    out.push_str("## Context Data\n\n");
    if let Some(updated) = &state.last_updated {
        out.push_str(&format!("**Last Updated**: {updated}\n"));
    }
    if let Some(changed) = &state.last_changed {
        out.push_str(&format!("**Last Changed**: {changed}\n"));
    }
    match state.context.as_ref().filter(|c| !c.is_null()) {
        Some(context) => {
            let field = |key: &str| context.get(key).filter(|v| !v.is_null()).map(display_value);
            out.push_str(&format!(
                "**Context ID**: {}\n",
                field("id").unwrap_or_else(|| "N/A".to_string())
            ));
            if let Some(parent) = field("parent_id") {
                out.push_str(&format!("**Parent Context**: {parent}\n"));
            }
            if let Some(user) = field("user_id") {
                out.push_str(&format!("**User ID**: {user}\n"));
            }
        }
        None => out.push_str("*No context information available.*\n"),
    }

    let related = related_domains(state.domain());
    if !related.is_empty() {
        out.push_str("\n## Related Entity Types\n\n");
        out.push_str("You may want to check entities in these related domains:\n");
        for domain in related {
            out.push_str(&format!("- [{domain}](resource:hass://entities/domain/{domain})\n"));
        }
    }
    out
}

pub fn render_all_entities(states: &[EntityState]) -> String {
    let mut out = String::from("# Home Assistant Entities\n\n");
    out.push_str(&format!("Total entities: {}\n\n", states.len()));
    out.push_str("**Note**: For better performance and token efficiency, consider using:\n");
    out.push_str("- Domain filtering: `[hass://entities/domain/{domain}](resource:hass://entities/domain/{domain})`\n");
    out.push_str("- Domain summaries: Use the `domain_summary` tool.\n");
    out.push_str("- Entity search: `[hass://search/{query}/{limit}](resource:hass://search/{query}/{limit})`\n\n");

    let mut by_domain: BTreeMap<&str, Vec<&EntityState>> = BTreeMap::new();
    for state in states {
        by_domain.entry(state.domain()).or_default().push(state);
    }

    for (domain, mut entities) in by_domain {
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        out.push_str(&format!(
            "## [{} ({})](resource:hass://entities/domain/{domain})\n\n",
            capitalize(domain),
            entities.len()
        ));
        for entity in entities {
            out.push_str(&entity_line(&entity.entity_id, &entity.state, entity.friendly_name()));
        }
        out.push('\n');
    }
    out
}

pub fn render_domain(domain: &str, entities: &[&EntityState]) -> String {
    let mut out = format!("# {} Entities\n\n", capitalize(domain));
    out.push_str(&format!("Total entities in this domain: {}\n\n", entities.len()));
    if entities.is_empty() {
        out.push_str("No entities found in this domain.\n");
        return out;
    }

    let mut sorted = entities.to_vec();
    sorted.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    for entity in sorted {
        out.push_str(&entity_line(&entity.entity_id, &entity.state, entity.friendly_name()));
    }

    out.push_str("\n## Related Information\n\n");
    out.push_str(&format!(
        "- Use the `domain_summary` tool for a concise overview of the '{domain}' domain.\n"
    ));
    out.push_str("- [View all entities](resource:hass://entities)\n");
    out
}

pub fn render_search(result: &analytics::SearchResult, limit: usize) -> String {
    let mut out = format!(
        "# Entity Search Results for '{}' (Limit: {limit})\n\n",
        result.query
    );
    if result.results.is_empty() {
        out.push_str("No entities found matching your search query.\n");
        return out;
    }
    out.push_str(&format!("Found {} matching entities:\n\n", result.results.len()));

    let mut by_domain: BTreeMap<&str, Vec<&analytics::SearchHit>> = BTreeMap::new();
    for hit in &result.results {
        let domain = if hit.domain.is_empty() {
            domain_of(&hit.entity_id)
        } else {
            hit.domain.as_str()
        };
        by_domain.entry(domain).or_default().push(hit);
    }

    for (domain, mut hits) in by_domain {
        hits.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        out.push_str(&format!(
            "## [{}](resource:hass://entities/domain/{domain})\n\n",
            capitalize(domain)
        ));
        for hit in hits {
            out.push_str(&entity_line(&hit.entity_id, &hit.state, Some(&hit.friendly_name)));
        }
        out.push('\n');
    }

    out.push_str("## Summary in JSON format\n\n```json\n");
    out.push_str(
        &serde_json::to_string_pretty(&result.results).unwrap_or_else(|_| "[]".to_string()),
    );
    out.push_str("\n```\n");
    out
}
