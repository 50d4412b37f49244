//! Lovelace dashboard requests.
//!
//! Views and cards are opaque documents; the only structure this module
//! looks at is the `url` of resource declarations, used to avoid adding the
//! same front-end module twice.

use crate::error::{CoreError, CoreResult};
use crate::types::is_path_safe;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardAction {
    Create,
    Update,
    Delete,
    Get,
}

impl DashboardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardAction::Create => "create",
            DashboardAction::Update => "update",
            DashboardAction::Delete => "delete",
            DashboardAction::Get => "get",
        }
    }
}

impl FromStr for DashboardAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(DashboardAction::Create),
            "update" => Ok(DashboardAction::Update),
            "delete" => Ok(DashboardAction::Delete),
            "get" => Ok(DashboardAction::Get),
            _ => Err(CoreError::UnknownDashboardAction(s.to_string())),
        }
    }
}

/// Arguments of a dashboard operation. A missing `dashboard_id` addresses
/// the default dashboard for `get` and `update`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardRequest {
    #[serde(default)]
    pub dashboard_id: Option<String>,
    /// Complete replacement document for `update`.
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_show_in_sidebar")]
    pub show_in_sidebar: bool,
    #[serde(default)]
    pub views: Option<Vec<Value>>,
    #[serde(default)]
    pub resources: Option<Vec<Value>>,
}

fn default_show_in_sidebar() -> bool {
    true
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            dashboard_id: None,
            config: None,
            title: None,
            icon: None,
            show_in_sidebar: default_show_in_sidebar(),
            views: None,
            resources: None,
        }
    }
}

impl DashboardRequest {
    /// Dashboard id with surrounding whitespace removed; blank counts as absent.
    pub fn id(&self) -> Option<&str> {
        self.dashboard_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Local argument checks for `action`; the documents themselves are not inspected.
    pub fn validate(&self, action: DashboardAction) -> CoreResult<()> {
        if let Some(id) = self.id() {
            if !is_path_safe(id) {
                return Err(CoreError::InvalidObjectId(id.to_string()));
            }
        }
        match action {
            DashboardAction::Create => {
                if self.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
                    return Err(CoreError::MissingDashboardField {
                        action: "create",
                        field: "title",
                    });
                }
            }
            DashboardAction::Delete => {
                if self.id().is_none() {
                    return Err(CoreError::MissingDashboardField {
                        action: "delete",
                        field: "dashboard_id",
                    });
                }
            }
            DashboardAction::Update => {
                if let Some(config) = &self.config {
                    if !config.is_object() {
                        return Err(CoreError::ConfigNotObject("dashboard".to_string()));
                    }
                } else if self.title.is_none() && self.views.is_none() && self.resources.is_none()
                {
                    return Err(CoreError::MissingDashboardField {
                        action: "update",
                        field: "config, title, views or resources",
                    });
                }
            }
            DashboardAction::Get => {}
        }
        Ok(())
    }

    /// URL path for a new dashboard: the given id, or a slug of the title.
    pub fn url_path(&self) -> String {
        match self.id() {
            Some(id) => id.to_string(),
            None => url_path_for(self.title.as_deref().unwrap_or_default()),
        }
    }

    /// Body registering a new dashboard under `url_path`.
    pub fn registration(&self, url_path: &str) -> Value {
        let mut body = json!({
            "url_path": url_path,
            "title": self.title.as_deref().unwrap_or_default().trim(),
            "show_in_sidebar": self.show_in_sidebar,
            "require_admin": false,
            "mode": "storage",
        });
        if let (Some(icon), Some(map)) = (&self.icon, body.as_object_mut()) {
            map.insert("icon".to_string(), Value::String(icon.clone()));
        }
        body
    }

    /// Initial configuration document written right after registration.
    pub fn initial_config(&self) -> Value {
        let mut config = Map::new();
        if let Some(title) = &self.title {
            config.insert("title".to_string(), Value::String(title.trim().to_string()));
        }
        config.insert(
            "views".to_string(),
            Value::Array(self.views.clone().unwrap_or_default()),
        );
        if let Some(resources) = &self.resources {
            if !resources.is_empty() {
                config.insert("resources".to_string(), Value::Array(resources.clone()));
            }
        }
        Value::Object(config)
    }

    /// Document to store for an update, given the currently stored one.
    pub fn updated_config(&self, current: &Value) -> Value {
        if let Some(config) = &self.config {
            return config.clone();
        }

        let mut updated = current.as_object().cloned().unwrap_or_default();
        if let Some(title) = &self.title {
            updated.insert("title".to_string(), Value::String(title.clone()));
        }
        if let Some(views) = &self.views {
            updated.insert("views".to_string(), Value::Array(views.clone()));
        }
        if let Some(resources) = &self.resources {
            let mut existing = match updated.remove("resources") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            merge_resources(&mut existing, resources);
            updated.insert("resources".to_string(), Value::Array(existing));
        }
        Value::Object(updated)
    }
}

/// Append `additions` whose `url` is not already declared, keeping order.
pub fn merge_resources(existing: &mut Vec<Value>, additions: &[Value]) {
    for resource in additions {
        let url = resource.get("url");
        let present = url.is_some() && existing.iter().any(|r| r.get("url") == url);
        if !present {
            existing.push(resource.clone());
        }
    }
}

/// Slug usable as a Lovelace URL path. Home Assistant requires a hyphen in it.
pub fn url_path_for(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        "dashboard-new".to_string()
    } else if slug.contains('-') {
        slug
    } else {
        format!("dashboard-{slug}")
    }
}
