//! Resolution of attribute updates to Home Assistant control operations.
//!
//! Each domain has an ordered list of services able to change attributes of
//! its entities. An update goes to the first service that accepts every
//! attribute named in it. Domains without a list are written back to the
//! state machine with the attributes merged in.

use crate::error::{CoreError, CoreResult};
use crate::types::EntityId;
use serde::Serialize;
use serde_json::{Map, Value};

/// A service of the entity's own domain plus the attributes it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOperation {
    pub service: &'static str,
    pub attributes: &'static [&'static str],
}

impl ServiceOperation {
    const fn new(service: &'static str, accepts: &'static [&'static str]) -> Self {
        Self {
            service,
            attributes: accepts,
        }
    }

    pub fn accepts(&self, attribute: &str) -> bool {
        self.attributes.contains(&attribute)
    }
}

/// Operation chosen for an attribute update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlOperation {
    /// `POST /api/services/{domain}/{service}` with the attributes as service data.
    Service { domain: String, service: String },
    /// `POST /api/states/{entity_id}` keeping the state and merging attributes.
    StateMerge,
}

impl ControlOperation {
    pub fn name(&self) -> String {
        match self {
            ControlOperation::Service { domain, service } => format!("{domain}.{service}"),
            ControlOperation::StateMerge => "state_merge".to_string(),
        }
    }
}

const LIGHT: &[ServiceOperation] = &[ServiceOperation::new(
    "turn_on",
    &[
        "brightness",
        "brightness_pct",
        "brightness_step",
        "brightness_step_pct",
        "color_name",
        "color_temp",
        "color_temp_kelvin",
        "effect",
        "flash",
        "hs_color",
        "kelvin",
        "profile",
        "rgb_color",
        "rgbw_color",
        "rgbww_color",
        "transition",
        "white",
        "xy_color",
    ],
)];

const CLIMATE: &[ServiceOperation] = &[
    ServiceOperation::new("set_hvac_mode", &["hvac_mode"]),
    ServiceOperation::new(
        "set_temperature",
        &["temperature", "target_temp_high", "target_temp_low", "hvac_mode"],
    ),
    ServiceOperation::new("set_fan_mode", &["fan_mode"]),
    ServiceOperation::new("set_preset_mode", &["preset_mode"]),
    ServiceOperation::new("set_humidity", &["humidity"]),
    ServiceOperation::new("set_swing_mode", &["swing_mode"]),
];

const COVER: &[ServiceOperation] = &[
    ServiceOperation::new("set_cover_position", &["position"]),
    ServiceOperation::new("set_cover_tilt_position", &["tilt_position"]),
];

const MEDIA_PLAYER: &[ServiceOperation] = &[
    ServiceOperation::new("volume_set", &["volume_level"]),
    ServiceOperation::new("volume_mute", &["is_volume_muted"]),
    ServiceOperation::new("select_source", &["source"]),
    ServiceOperation::new("select_sound_mode", &["sound_mode"]),
    ServiceOperation::new(
        "play_media",
        &["media_content_id", "media_content_type", "enqueue"],
    ),
];

const FAN: &[ServiceOperation] = &[
    ServiceOperation::new("set_percentage", &["percentage"]),
    ServiceOperation::new("set_preset_mode", &["preset_mode"]),
    ServiceOperation::new("oscillate", &["oscillating"]),
    ServiceOperation::new("set_direction", &["direction"]),
];

const HUMIDIFIER: &[ServiceOperation] = &[
    ServiceOperation::new("set_humidity", &["humidity"]),
    ServiceOperation::new("set_mode", &["mode"]),
];

const WATER_HEATER: &[ServiceOperation] = &[
    ServiceOperation::new("set_operation_mode", &["operation_mode"]),
    ServiceOperation::new("set_temperature", &["temperature", "operation_mode"]),
];

const VACUUM: &[ServiceOperation] = &[ServiceOperation::new("set_fan_speed", &["fan_speed"])];

const NUMBER: &[ServiceOperation] = &[ServiceOperation::new("set_value", &["value"])];

const SELECT: &[ServiceOperation] = &[ServiceOperation::new("select_option", &["option"])];

const TEXT: &[ServiceOperation] = &[ServiceOperation::new("set_value", &["value"])];

const DATETIME: &[ServiceOperation] = &[ServiceOperation::new(
    "set_datetime",
    &["date", "time", "datetime", "timestamp"],
)];

/// Services able to change attributes of entities in `domain`, in priority order.
/// An empty slice means the domain falls back to a state merge.
pub fn operations_for(domain: &str) -> &'static [ServiceOperation] {
    match domain {
        "light" => LIGHT,
        "climate" => CLIMATE,
        "cover" => COVER,
        "media_player" => MEDIA_PLAYER,
        "fan" => FAN,
        "humidifier" => HUMIDIFIER,
        "water_heater" => WATER_HEATER,
        "vacuum" => VACUUM,
        "input_number" | "number" => NUMBER,
        "input_select" | "select" => SELECT,
        "input_text" | "text" => TEXT,
        "input_datetime" => DATETIME,
        _ => &[],
    }
}

/// Pick the control operation for an attribute update on `entity`.
pub fn resolve(entity: &EntityId, attributes: &Map<String, Value>) -> CoreResult<ControlOperation> {
    if attributes.is_empty() {
        return Err(CoreError::EmptyAttributes(entity.to_string()));
    }

    let operations = operations_for(entity.domain());
    if operations.is_empty() {
        return Ok(ControlOperation::StateMerge);
    }

    if let Some(op) = operations
        .iter()
        .find(|op| attributes.keys().all(|key| op.accepts(key)))
    {
        return Ok(ControlOperation::Service {
            domain: entity.domain().to_string(),
            service: op.service.to_string(),
        });
    }

    // Report against the operation that covers the most of the request.
    let closest = operations
        .iter()
        .enumerate()
        .max_by_key(|(index, op)| {
            (
                attributes.keys().filter(|key| op.accepts(key)).count(),
                std::cmp::Reverse(*index),
            )
        })
        .map(|(_, op)| op)
        .unwrap_or(&operations[0]);
    let rejected = attributes
        .keys()
        .find(|key| !closest.accepts(key))
        .cloned()
        .unwrap_or_default();

    Err(CoreError::UnsupportedAttribute {
        attribute: rejected,
        operation: format!("{}.{}", entity.domain(), closest.service),
    })
}

/// Service data for a resolved service operation: the target plus the given attributes.
pub fn service_payload(entity: &EntityId, attributes: &Map<String, Value>) -> Value {
    let mut body = Map::with_capacity(attributes.len() + 1);
    body.insert("entity_id".to_string(), Value::String(entity.to_string()));
    for (key, value) in attributes {
        body.insert(key.clone(), value.clone());
    }
    Value::Object(body)
}

/// Attribute map after a state merge: current attributes overlaid with the update.
pub fn merge_attributes(current: &Map<String, Value>, update: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = current.clone();
    for (key, value) in update {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
