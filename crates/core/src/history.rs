//! Condensing raw state history into something an agent can read.

use crate::types::EntityState;
use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_HISTORY_HOURS: u32 = 24;

/// Attributes kept per point in minimal mode.
const MINIMAL_ATTRIBUTES: [&str; 3] = ["unit_of_measurement", "friendly_name", "device_class"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub hours: u32,
    /// Sample down to ~100 points and keep only a few attributes.
    pub minimal: bool,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            hours: DEFAULT_HISTORY_HOURS,
            minimal: true,
        }
    }
}

impl HistoryOptions {
    fn max_points(&self) -> usize {
        if self.minimal {
            100
        } else {
            1000
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub state: Value,
    pub last_changed: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Stable,
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStatistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub entity_id: String,
    pub states: Vec<HistoryPoint>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_changed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<HistoryStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Summarize the history of `current` from the records returned for it by
/// `/api/history/period`.
pub fn summarize(current: &EntityState, records: &[Value], options: HistoryOptions) -> HistorySummary {
    if records.is_empty() {
        return HistorySummary {
            entity_id: current.entity_id.clone(),
            states: Vec::new(),
            count: 0,
            first_changed: None,
            last_changed: None,
            statistics: None,
            note: Some("No history data found for this entity in the specified time range.".to_string()),
        };
    }

    let max_points = options.max_points();
    let sample_rate = if records.len() > max_points {
        (records.len() / max_points).max(1)
    } else {
        1
    };
    let last_index = records.len() - 1;

    let mut states = Vec::new();
    let mut numeric = Vec::new();

    for (i, record) in records.iter().enumerate() {
        if options.minimal && i % sample_rate != 0 && i != last_index {
            continue;
        }

        let state = record.get("state").cloned().unwrap_or(Value::Null);
        if let Some(value) = state.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
            if value.is_finite() {
                numeric.push(value);
            }
        }

        let all_attributes = record.get("attributes").and_then(Value::as_object);
        let attributes = if options.minimal {
            let kept: Map<String, Value> = all_attributes
                .map(|attrs| {
                    MINIMAL_ATTRIBUTES
                        .iter()
                        .filter_map(|key| attrs.get(*key).map(|v| (key.to_string(), v.clone())))
                        .collect()
                })
                .unwrap_or_default();
            (!kept.is_empty()).then_some(kept)
        } else {
            Some(all_attributes.cloned().unwrap_or_default())
        };

        states.push(HistoryPoint {
            state,
            last_changed: record.get("last_changed").cloned().unwrap_or(Value::Null),
            attributes,
        });
    }

    let first_changed = states
        .first()
        .map(|p| p.last_changed.clone())
        .filter(|v| !v.is_null());
    let last_changed = states
        .last()
        .map(|p| p.last_changed.clone())
        .filter(|v| !v.is_null());

    HistorySummary {
        entity_id: current.entity_id.clone(),
        count: states.len(),
        states,
        first_changed,
        last_changed,
        statistics: statistics(current, &numeric, options.hours),
        note: None,
    }
}

fn statistics(current: &EntityState, values: &[f64], hours: u32) -> Option<HistoryStatistics> {
    let first = *values.first()?;
    let last = *values.last()?;
    let avg = values.iter().sum::<f64>() / values.len() as f64;

    let mut stats = HistoryStatistics {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg,
        count: values.len(),
        change: None,
        trend: None,
        unit: None,
        daily_avg: None,
        weekly_avg: None,
        device_class: None,
    };

    if current.domain() == "sensor" && values.len() > 1 {
        let change = last - first;
        stats.change = Some(change);
        stats.trend = Some(if change.abs() < 0.01 * first.abs().max(0.01) {
            Trend::Stable
        } else if change > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        });

        if let Some(unit) = current
            .attributes
            .get("unit_of_measurement")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
        {
            stats.unit = Some(unit.to_string());
            if hours <= 24 {
                stats.daily_avg = Some(avg);
            } else if hours <= 168 {
                stats.weekly_avg = Some(avg);
            }
        }

        stats.device_class = current.attributes.get("device_class").cloned();
    }

    Some(stats)
}
