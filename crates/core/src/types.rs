use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Reference to a Home Assistant entity, `<domain>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    raw: String,
    dot: usize,
}

impl EntityId {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let raw = raw.trim();
        match raw.find('.') {
            Some(dot)
                if dot > 0
                    && dot + 1 < raw.len()
                    && !raw.contains(char::is_whitespace)
                    && is_path_safe(raw) =>
            {
                Ok(Self {
                    raw: raw.to_string(),
                    dot,
                })
            }
            _ => Err(CoreError::InvalidEntityId(raw.to_string())),
        }
    }

    /// The dispatch key: everything before the first dot.
    pub fn domain(&self) -> &str {
        &self.raw[..self.dot]
    }

    pub fn object_id(&self) -> &str {
        &self.raw[self.dot + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.raw
    }
}

/// Domain prefix of a raw entity id string, or the whole string if it has no dot.
pub fn domain_of(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or(entity_id)
}

/// Entity state as returned by `/api/states`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl EntityState {
    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(Value::as_str)
    }

    /// Friendly name, falling back to the entity id.
    pub fn display_name(&self) -> &str {
        self.friendly_name().unwrap_or(&self.entity_id)
    }
}

/// Kinds of stored configuration the bridge can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Automation,
    Script,
    Scene,
    Dashboard,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Automation,
        ComponentKind::Script,
        ComponentKind::Scene,
        ComponentKind::Dashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Automation => "automation",
            ComponentKind::Script => "script",
            ComponentKind::Scene => "scene",
            ComponentKind::Dashboard => "dashboard",
        }
    }

    /// Service that makes Home Assistant pick up a changed configuration.
    /// Dashboards are read on demand and need none.
    pub fn reload_service(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ComponentKind::Automation => Some(("automation", "reload")),
            ComponentKind::Script => Some(("script", "reload")),
            ComponentKind::Scene => Some(("scene", "reload")),
            ComponentKind::Dashboard => None,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automation" => Ok(ComponentKind::Automation),
            "script" => Ok(ComponentKind::Script),
            "scene" => Ok(ComponentKind::Scene),
            "dashboard" => Ok(ComponentKind::Dashboard),
            _ => Err(CoreError::UnknownComponentKind(s.to_string())),
        }
    }
}

/// Characters that would end or re-encode a REST path segment.
const PATH_RESERVED: &[char] = &['/', '\\', '?', '#', '%'];

/// Whether `segment` can be placed into a REST path as a single segment
/// without `Url::join` resolving it to a different resource.
pub fn is_path_safe(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(PATH_RESERVED)
}

/// (kind, object_id) key of a stored component. Uniqueness is enforced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    kind: ComponentKind,
    object_id: String,
}

impl ComponentRef {
    pub fn new(kind: ComponentKind, object_id: impl Into<String>) -> CoreResult<Self> {
        let object_id = object_id.into().trim().to_string();
        if object_id.is_empty() {
            return Err(CoreError::EmptyObjectId);
        }
        if !is_path_safe(&object_id) {
            return Err(CoreError::InvalidObjectId(object_id));
        }
        Ok(Self { kind, object_id })
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// REST path holding this component's stored configuration.
    pub fn config_path(&self) -> String {
        match self.kind {
            ComponentKind::Dashboard => {
                format!("/api/lovelace/dashboards/{}/config", self.object_id)
            }
            kind => format!("/api/config/{}/config/{}", kind, self.object_id),
        }
    }

    /// REST path used to remove this component.
    pub fn delete_path(&self) -> String {
        match self.kind {
            ComponentKind::Dashboard => format!("/api/lovelace/dashboards/{}", self.object_id),
            _ => self.config_path(),
        }
    }
}

impl std::fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.object_id)
    }
}

/// Checks the only local constraint on a configuration payload.
pub fn require_object<'a>(
    component: &ComponentRef,
    config: &'a Value,
) -> CoreResult<&'a Map<String, Value>> {
    config
        .as_object()
        .ok_or_else(|| CoreError::ConfigNotObject(component.to_string()))
}

/// Shallow merge of `patch` over `current`; keys in `patch` win.
pub fn shallow_merge(current: &Value, patch: &Map<String, Value>) -> Value {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_parse() {
        let id = EntityId::parse("light.kitchen_ceiling").unwrap();
        assert_eq!(id.domain(), "light");
        assert_eq!(id.object_id(), "kitchen_ceiling");
        assert_eq!(id.to_string(), "light.kitchen_ceiling");
    }

    #[test]
    fn test_entity_id_rejects_malformed() {
        for raw in ["", "light", ".kitchen", "light.", "light kitchen.x", "a/b.c", "light.x?y", "sensor.a#b"] {
            assert!(EntityId::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_entity_id_serde_as_string() {
        let id: EntityId = serde_json::from_value(json!("sensor.outdoor_temp")).unwrap();
        assert_eq!(id.domain(), "sensor");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("sensor.outdoor_temp"));
        assert!(serde_json::from_value::<EntityId>(json!("nodot")).is_err());
    }

    #[test]
    fn test_entity_state_defaults() {
        let state: EntityState =
            serde_json::from_value(json!({"entity_id": "sun.sun", "state": "above_horizon"}))
                .unwrap();
        assert!(state.attributes.is_empty());
        assert_eq!(state.domain(), "sun");
        assert_eq!(state.display_name(), "sun.sun");
    }

    #[test]
    fn test_component_kind_from_str() {
        assert_eq!("automation".parse::<ComponentKind>().unwrap(), ComponentKind::Automation);
        assert_eq!("Scene".parse::<ComponentKind>().unwrap(), ComponentKind::Scene);
        assert!(matches!(
            "blueprint".parse::<ComponentKind>(),
            Err(CoreError::UnknownComponentKind(_))
        ));
    }

    #[test]
    fn test_component_paths() {
        let automation = ComponentRef::new(ComponentKind::Automation, "morning").unwrap();
        assert_eq!(automation.config_path(), "/api/config/automation/config/morning");
        assert_eq!(automation.delete_path(), automation.config_path());

        let dashboard = ComponentRef::new(ComponentKind::Dashboard, "dashboard-energy").unwrap();
        assert_eq!(
            dashboard.config_path(),
            "/api/lovelace/dashboards/dashboard-energy/config"
        );
        assert_eq!(dashboard.delete_path(), "/api/lovelace/dashboards/dashboard-energy");
    }

    #[test]
    fn test_component_ref_validation() {
        assert_eq!(
            ComponentRef::new(ComponentKind::Script, "  "),
            Err(CoreError::EmptyObjectId)
        );
        for id in ["a/b", ".", "..", "x?y", "?x", "#x", "a\\b", "%2e%2e", "a%2Fb"] {
            assert!(
                matches!(
                    ComponentRef::new(ComponentKind::Script, id),
                    Err(CoreError::InvalidObjectId(_))
                ),
                "{id} should be rejected"
            );
        }
        assert!(ComponentRef::new(ComponentKind::Script, "morning.lights").is_ok());
        assert!(ComponentRef::new(ComponentKind::Script, "...").is_ok());
    }

    #[test]
    fn test_reload_service() {
        assert_eq!(
            ComponentKind::Scene.reload_service(),
            Some(("scene", "reload"))
        );
        assert_eq!(ComponentKind::Dashboard.reload_service(), None);
    }

    #[test]
    fn test_require_object() {
        let component = ComponentRef::new(ComponentKind::Automation, "a1").unwrap();
        assert!(require_object(&component, &json!({"alias": "x"})).is_ok());
        assert_eq!(
            require_object(&component, &json!([1, 2])),
            Err(CoreError::ConfigNotObject("automation/a1".to_string()))
        );
    }

    #[test]
    fn test_shallow_merge() {
        let current = json!({"alias": "Old", "mode": "single", "trigger": [{"platform": "sun"}]});
        let patch = json!({"alias": "New", "trigger": []});
        let merged = shallow_merge(&current, patch.as_object().unwrap());
        assert_eq!(merged, json!({"alias": "New", "mode": "single", "trigger": []}));
    }
}
