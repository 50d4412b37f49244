//! Field projection for entity states.
//!
//! Agents rarely need every attribute of an entity, so states are projected
//! down to a lean view unless fields are requested explicitly.

use crate::types::EntityState;
use serde_json::{Map, Value};

/// A field of an entity state that can be selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSelector {
    State,
    Attributes,
    Attribute(String),
    Context,
    LastUpdated,
    LastChanged,
}

impl FieldSelector {
    /// Parses `state`, `attributes`, `attr.<name>`, `context`, `last_updated`
    /// or `last_changed`. Anything else selects nothing.
    pub fn parse(field: &str) -> Option<Self> {
        match field.trim() {
            "state" => Some(Self::State),
            "attributes" => Some(Self::Attributes),
            "context" => Some(Self::Context),
            "last_updated" => Some(Self::LastUpdated),
            "last_changed" => Some(Self::LastChanged),
            other => other
                .strip_prefix("attr.")
                .filter(|name| !name.is_empty())
                .map(|name| Self::Attribute(name.to_string())),
        }
    }

    pub fn parse_all<S: AsRef<str>>(fields: &[S]) -> Vec<Self> {
        fields
            .iter()
            .filter_map(|f| Self::parse(f.as_ref()))
            .collect()
    }
}

/// Attributes worth keeping in the lean view of each domain.
pub fn important_attributes(domain: &str) -> &'static [&'static str] {
    match domain {
        "light" => &["brightness", "color_temp", "color_mode", "rgb_color"],
        "switch" => &["device_class", "icon"],
        "binary_sensor" => &["device_class", "is_on"],
        "sensor" => &["unit_of_measurement", "device_class", "state_class"],
        "climate" => &["temperature", "current_temperature", "hvac_mode", "hvac_action"],
        "cover" => &["current_position", "current_tilt_position"],
        "media_player" => &["media_title", "media_artist", "volume_level", "source"],
        "camera" => &["entity_picture"],
        _ => &[],
    }
}

/// Lean selection: state, friendly name and the domain's important attributes.
pub fn lean_fields(domain: &str) -> Vec<FieldSelector> {
    let mut fields = vec![
        FieldSelector::State,
        FieldSelector::Attribute("friendly_name".to_string()),
    ];
    fields.extend(
        important_attributes(domain)
            .iter()
            .map(|name| FieldSelector::Attribute(name.to_string())),
    );
    fields
}

/// Project an entity onto the selected fields. `entity_id` is always kept.
pub fn project(entity: &EntityState, fields: &[FieldSelector]) -> Value {
    let mut out = Map::new();
    out.insert("entity_id".to_string(), Value::String(entity.entity_id.clone()));

    for field in fields {
        match field {
            FieldSelector::State => {
                out.insert("state".to_string(), Value::String(entity.state.clone()));
            }
            FieldSelector::Attributes => {
                out.insert(
                    "attributes".to_string(),
                    Value::Object(entity.attributes.clone()),
                );
            }
            FieldSelector::Attribute(name) => {
                if let Some(value) = entity.attributes.get(name) {
                    let attributes = out
                        .entry("attributes")
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(map) = attributes {
                        map.insert(name.clone(), value.clone());
                    }
                }
            }
            FieldSelector::Context => {
                if let Some(context) = &entity.context {
                    out.insert("context".to_string(), context.clone());
                }
            }
            FieldSelector::LastUpdated => {
                if let Some(ts) = &entity.last_updated {
                    out.insert("last_updated".to_string(), Value::String(ts.clone()));
                }
            }
            FieldSelector::LastChanged => {
                if let Some(ts) = &entity.last_changed {
                    out.insert("last_changed".to_string(), Value::String(ts.clone()));
                }
            }
        }
    }

    Value::Object(out)
}

pub fn project_lean(entity: &EntityState) -> Value {
    project(entity, &lean_fields(entity.domain()))
}

/// How a state should be rendered back to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Lean,
    Full,
    Fields(Vec<FieldSelector>),
}

impl View {
    /// Explicit fields win over `detailed`, which wins over the lean default.
    pub fn select(fields: Option<&[String]>, detailed: bool) -> Self {
        match fields {
            Some(fields) if !fields.is_empty() => View::Fields(FieldSelector::parse_all(fields)),
            _ if detailed => View::Full,
            _ => View::Lean,
        }
    }

    pub fn render(&self, entity: &EntityState) -> Value {
        match self {
            View::Lean => project_lean(entity),
            View::Full => serde_json::to_value(entity).unwrap_or(Value::Null),
            View::Fields(fields) => project(entity, fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light() -> EntityState {
        serde_json::from_value(json!({
            "entity_id": "light.kitchen",
            "state": "on",
            "attributes": {
                "friendly_name": "Kitchen",
                "brightness": 180,
                "supported_features": 44,
                "min_mireds": 153
            },
            "last_changed": "2024-03-01T10:00:00+00:00",
            "last_updated": "2024-03-01T10:05:00+00:00",
            "context": {"id": "01HQ", "parent_id": null, "user_id": null}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!(FieldSelector::parse("state"), Some(FieldSelector::State));
        assert_eq!(
            FieldSelector::parse("attr.brightness"),
            Some(FieldSelector::Attribute("brightness".to_string()))
        );
        assert_eq!(FieldSelector::parse("attr."), None);
        assert_eq!(FieldSelector::parse("nonsense"), None);
    }

    #[test]
    fn test_lean_projection() {
        let lean = project_lean(&light());
        assert_eq!(
            lean,
            json!({
                "entity_id": "light.kitchen",
                "state": "on",
                "attributes": {"friendly_name": "Kitchen", "brightness": 180}
            })
        );
    }

    #[test]
    fn test_explicit_fields() {
        let fields = FieldSelector::parse_all(&["last_changed", "attr.min_mireds", "attr.missing"]);
        let projected = project(&light(), &fields);
        assert_eq!(
            projected,
            json!({
                "entity_id": "light.kitchen",
                "last_changed": "2024-03-01T10:00:00+00:00",
                "attributes": {"min_mireds": 153}
            })
        );
    }

    #[test]
    fn test_view_selection() {
        let none: Vec<String> = Vec::new();
        let state = vec!["state".to_string()];
        assert_eq!(View::select(None, false), View::Lean);
        assert_eq!(View::select(Some(none.as_slice()), true), View::Full);
        let view = View::select(Some(state.as_slice()), true);
        assert_eq!(view, View::Fields(vec![FieldSelector::State]));
        assert_eq!(
            view.render(&light()),
            json!({"entity_id": "light.kitchen", "state": "on"})
        );
    }

    #[test]
    fn test_full_view_keeps_everything() {
        let full = View::Full.render(&light());
        assert_eq!(full["attributes"]["supported_features"], 44);
        assert_eq!(full["context"]["id"], "01HQ");
    }
}
