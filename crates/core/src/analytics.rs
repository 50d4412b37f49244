//! Aggregations over the full set of entity states.
//!
//! All maps are `BTreeMap` and every ranking breaks ties by name, so the
//! same input always yields the same output.

use crate::filter::{important_attributes, project_lean};
use crate::types::EntityState;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_EXAMPLE_LIMIT: usize = 3;

/// Filter for entity listings.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    pub domain: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl EntityQuery {
    /// Search term in lowercase, or `None` for blank queries and `*`.
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty() && *q != "*")
            .map(str::to_lowercase)
    }
}

/// Case-insensitive match against entity id, friendly name, state and scalar attributes.
pub fn matches(entity: &EntityState, term: &str) -> bool {
    if entity.entity_id.to_lowercase().contains(term)
        || entity.state.to_lowercase().contains(term)
    {
        return true;
    }
    entity.attributes.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(term),
        Value::Number(n) => n.to_string().contains(term),
        Value::Bool(b) => b.to_string().contains(term),
        _ => false,
    })
}

/// Apply domain filter, search and limit, in that order, keeping upstream order.
pub fn select<'a>(entities: &'a [EntityState], query: &EntityQuery) -> Vec<&'a EntityState> {
    let term = query.search_term();
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let filtered = entities
        .iter()
        .filter(|e| query.domain.as_deref().map_or(true, |d| e.domain() == d))
        .filter(|e| term.as_deref().map_or(true, |t| matches(e, t)));

    if limit == 0 {
        filtered.collect()
    } else {
        filtered.take(limit).collect()
    }
}

/// Compact search hit with one domain-specific key attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub entity_id: String,
    pub state: String,
    pub domain: String,
    pub friendly_name: String,
    #[serde(flatten)]
    pub key_attribute: BTreeMap<String, Value>,
}

impl SearchHit {
    pub fn from_entity(entity: &EntityState) -> Self {
        let domain = entity.domain().to_string();
        let key = match domain.as_str() {
            "light" => Some(("brightness", "brightness")),
            "sensor" => Some(("unit_of_measurement", "unit")),
            "climate" => Some(("temperature", "temperature")),
            "media_player" => Some(("media_title", "media_title")),
            _ => None,
        };
        let key_attribute = key
            .and_then(|(attr, label)| {
                entity
                    .attributes
                    .get(attr)
                    .map(|value| (label.to_string(), value.clone()))
            })
            .into_iter()
            .collect();

        Self {
            entity_id: entity.entity_id.clone(),
            state: entity.state.clone(),
            domain,
            friendly_name: entity.display_name().to_string(),
            key_attribute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub count: usize,
    pub results: Vec<SearchHit>,
    pub domains: BTreeMap<String, usize>,
    pub query: String,
}

/// Search entities; a blank query or `*` lists everything up to `limit`.
pub fn search(entities: &[EntityState], query: &str, limit: usize) -> SearchResult {
    let entity_query = EntityQuery {
        domain: None,
        search: Some(query.to_string()),
        limit: Some(limit),
    };
    let label = match entity_query.search_term() {
        Some(_) => query.trim().to_string(),
        None => "all entities (no filtering)".to_string(),
    };

    let results: Vec<SearchHit> = select(entities, &entity_query)
        .into_iter()
        .map(SearchHit::from_entity)
        .collect();

    let mut domains = BTreeMap::new();
    for hit in &results {
        *domains.entry(hit.domain.clone()).or_insert(0) += 1;
    }

    SearchResult {
        count: results.len(),
        results,
        domains,
        query: label,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityExample {
    pub entity_id: String,
    pub friendly_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary {
    pub domain: String,
    pub total_count: usize,
    pub state_distribution: BTreeMap<String, usize>,
    pub examples: BTreeMap<String, Vec<EntityExample>>,
    /// Top ten attribute names with the number of entities carrying them.
    pub common_attributes: Vec<(String, usize)>,
}

pub fn summarize_domain(
    entities: &[EntityState],
    domain: &str,
    example_limit: usize,
) -> DomainSummary {
    let mut state_distribution = BTreeMap::new();
    let mut examples: BTreeMap<String, Vec<EntityExample>> = BTreeMap::new();
    let mut attribute_counts = BTreeMap::new();
    let mut total_count = 0;

    for entity in entities.iter().filter(|e| e.domain() == domain) {
        total_count += 1;
        *state_distribution.entry(entity.state.clone()).or_insert(0) += 1;

        let bucket = examples.entry(entity.state.clone()).or_default();
        if bucket.len() < example_limit {
            bucket.push(EntityExample {
                entity_id: entity.entity_id.clone(),
                friendly_name: entity.display_name().to_string(),
            });
        }

        for key in entity.attributes.keys() {
            *attribute_counts.entry(key.clone()).or_insert(0) += 1;
        }
    }

    DomainSummary {
        domain: domain.to_string(),
        total_count,
        state_distribution,
        examples,
        common_attributes: top_counts(attribute_counts, 10),
    }
}

/// Highest counts first, ties broken by name.
fn top_counts(counts: BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainOverview {
    pub count: usize,
    pub states: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySample {
    pub entity_id: String,
    pub state: String,
    pub friendly_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemOverview {
    pub total_entities: usize,
    pub domains: BTreeMap<String, DomainOverview>,
    pub domain_samples: BTreeMap<String, Vec<EntitySample>>,
    pub domain_attributes: BTreeMap<String, Vec<String>>,
    pub area_distribution: BTreeMap<String, BTreeMap<String, usize>>,
    pub domain_count: usize,
    pub most_common_domains: Vec<(String, usize)>,
}

pub fn system_overview(entities: &[EntityState]) -> SystemOverview {
    let mut by_domain: BTreeMap<&str, Vec<&EntityState>> = BTreeMap::new();
    for entity in entities {
        by_domain.entry(entity.domain()).or_default().push(entity);
    }

    let mut domains = BTreeMap::new();
    let mut domain_samples = BTreeMap::new();
    let mut domain_attributes = BTreeMap::new();
    let mut area_distribution: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut domain_sizes = BTreeMap::new();

    for (domain, members) in &by_domain {
        let mut states = BTreeMap::new();
        for entity in members {
            *states.entry(entity.state.clone()).or_insert(0) += 1;
        }
        domains.insert(
            domain.to_string(),
            DomainOverview {
                count: members.len(),
                states,
            },
        );
        domain_sizes.insert(domain.to_string(), members.len());

        let samples = members
            .iter()
            .take(DEFAULT_EXAMPLE_LIMIT)
            .map(|e| EntitySample {
                entity_id: e.entity_id.clone(),
                state: e.state.clone(),
                friendly_name: e.display_name().to_string(),
            })
            .collect::<Vec<_>>();
        domain_samples.insert(domain.to_string(), samples);

        // Attribute frequency is taken over the lean projection.
        let mut attribute_counts = BTreeMap::new();
        for entity in members {
            if let Some(attributes) = project_lean(entity)
                .get("attributes")
                .and_then(Value::as_object)
            {
                for key in attributes.keys() {
                    *attribute_counts.entry(key.clone()).or_insert(0) += 1;
                }
            }
        }
        domain_attributes.insert(
            domain.to_string(),
            top_counts(attribute_counts, 5)
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
        );

        for entity in members {
            let area = area_label(entity);
            *area_distribution
                .entry(area)
                .or_default()
                .entry(domain.to_string())
                .or_insert(0) += 1;
        }
    }

    SystemOverview {
        total_entities: entities.len(),
        domain_count: domains.len(),
        most_common_domains: top_counts(domain_sizes, 5),
        domains,
        domain_samples,
        domain_attributes,
        area_distribution,
    }
}

fn area_label(entity: &EntityState) -> String {
    ["area_name", "area_id"]
        .iter()
        .find_map(|key| entity.attributes.get(*key).and_then(Value::as_str))
        .unwrap_or("Unknown")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationInfo {
    pub id: String,
    pub entity_id: String,
    pub state: String,
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<Value>,
}

pub fn automations(entities: &[EntityState]) -> Vec<AutomationInfo> {
    entities
        .iter()
        .filter(|e| e.domain() == "automation")
        .map(|e| AutomationInfo {
            id: e
                .entity_id
                .split_once('.')
                .map(|(_, id)| id.to_string())
                .unwrap_or_default(),
            entity_id: e.entity_id.clone(),
            state: e.state.clone(),
            alias: e.display_name().to_string(),
            last_triggered: e.attributes.get("last_triggered").cloned(),
        })
        .collect()
}

/// Attribute names shown first when rendering a single entity.
pub fn key_attribute_names(domain: &str) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = match domain {
        "light" => vec![
            "brightness",
            "color_temp",
            "rgb_color",
            "supported_features",
            "supported_color_modes",
        ],
        "media_player" => vec!["media_title", "media_artist", "source", "volume_level", "media_content_type"],
        "switch" | "binary_sensor" => vec!["device_class", "is_on"],
        other => important_attributes(other).to_vec(),
    };
    for common in ["device_class", "unit_of_measurement", "friendly_name"] {
        if !names.contains(&common) {
            names.push(common);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn states() -> Vec<EntityState> {
        serde_json::from_value(json!([
            {"entity_id": "light.kitchen", "state": "on",
             "attributes": {"friendly_name": "Kitchen Light", "brightness": 200, "area_id": "kitchen"}},
            {"entity_id": "light.hall", "state": "off",
             "attributes": {"friendly_name": "Hall"}},
            {"entity_id": "light.porch", "state": "off",
             "attributes": {"friendly_name": "Porch", "area_name": "Outside"}},
            {"entity_id": "sensor.kitchen_temp", "state": "21.4",
             "attributes": {"friendly_name": "Kitchen Temperature", "unit_of_measurement": "°C",
                            "device_class": "temperature"}},
            {"entity_id": "automation.morning", "state": "on",
             "attributes": {"friendly_name": "Morning Routine",
                            "last_triggered": "2024-03-01T06:30:00+00:00"}},
            {"entity_id": "automation.night", "state": "off", "attributes": {}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_select_by_domain_and_limit() {
        let states = states();
        let lights = select(
            &states,
            &EntityQuery {
                domain: Some("light".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(lights.len(), 3);

        let limited = select(
            &states,
            &EntityQuery {
                limit: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].entity_id, "light.kitchen");
    }

    #[test]
    fn test_search_matches_names_and_attributes() {
        let states = states();
        let result = search(&states, "KITCHEN", 20);
        assert_eq!(result.count, 2);
        assert_eq!(result.domains.get("light"), Some(&1));
        assert_eq!(result.domains.get("sensor"), Some(&1));
        assert_eq!(result.query, "KITCHEN");

        let by_unit = search(&states, "°c", 20);
        assert_eq!(by_unit.count, 1);
    }

    #[test]
    fn test_search_hit_key_attribute() {
        let states = states();
        let result = search(&states, "kitchen", 20);
        let hits = serde_json::to_value(&result.results).unwrap();
        assert_eq!(hits[0]["brightness"], 200);
        assert_eq!(hits[1]["unit"], "°C");
        assert!(hits[1].get("unit_of_measurement").is_none());
    }

    #[test]
    fn test_search_wildcard_lists_all() {
        let states = states();
        let result = search(&states, "*", 4);
        assert_eq!(result.count, 4);
        assert_eq!(result.query, "all entities (no filtering)");
    }

    #[test]
    fn test_summarize_domain() {
        let states = states();
        let summary = summarize_domain(&states, "light", 1);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.state_distribution.get("off"), Some(&2));
        assert_eq!(summary.examples["off"].len(), 1);
        assert_eq!(summary.examples["off"][0].entity_id, "light.hall");
        assert_eq!(summary.common_attributes[0], ("friendly_name".to_string(), 3));
    }

    #[test]
    fn test_system_overview() {
        let states = states();
        let overview = system_overview(&states);
        assert_eq!(overview.total_entities, 6);
        assert_eq!(overview.domain_count, 3);
        assert_eq!(overview.most_common_domains[0], ("light".to_string(), 3));
        assert_eq!(overview.most_common_domains[1], ("automation".to_string(), 2));
        assert_eq!(overview.domains["light"].states.get("off"), Some(&2));
        assert_eq!(overview.area_distribution["kitchen"]["light"], 1);
        assert_eq!(overview.area_distribution["Outside"]["light"], 1);
        assert_eq!(overview.area_distribution["Unknown"]["automation"], 2);
        assert!(overview.domain_attributes["sensor"].contains(&"unit_of_measurement".to_string()));
    }

    #[test]
    fn test_automations() {
        let states = states();
        let list = automations(&states);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "morning");
        assert_eq!(list[0].alias, "Morning Routine");
        assert!(list[0].last_triggered.is_some());
        assert_eq!(list[1].alias, "automation.night");
        assert!(list[1].last_triggered.is_none());
    }

    #[test]
    fn test_key_attribute_names() {
        let names = key_attribute_names("sensor");
        assert_eq!(
            names,
            vec!["unit_of_measurement", "device_class", "state_class", "friendly_name"]
        );
    }
}
