//! Component configurator: automations, scripts, scenes and dashboards.
//!
//! Configurations are opaque documents. The only local checks are a usable
//! object id and a JSON object payload; Home Assistant validates the rest.

use crate::client::HassClient;
use crate::error::{HassError, HassResult};
use hassbridge_core::types::{require_object, shallow_merge, ComponentKind, ComponentRef};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Components API.
pub struct ComponentsApi<'a> {
    client: &'a HassClient,
}

/// Result of a successful configure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigureOutcome {
    pub result: &'static str,
    pub component_type: ComponentKind,
    pub object_id: String,
    /// `true` when an existing configuration was merged into.
    pub merged: bool,
    pub reloaded: bool,
    /// Body returned by Home Assistant, if any.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub response: Value,
}

/// Result of a successful delete. `deleted` is `false` when the component
/// did not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub result: &'static str,
    pub component_type: ComponentKind,
    pub object_id: String,
    pub deleted: bool,
    pub reloaded: bool,
}

impl<'a> ComponentsApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// Read the stored configuration.
    pub async fn get(&self, component: &ComponentRef) -> HassResult<Value> {
        self.client.http.get(&component.config_path()).await
    }

    /// Create or replace the configuration of `component`. With `update`,
    /// the given keys are merged over the stored configuration instead.
    pub async fn configure(
        &self,
        component: &ComponentRef,
        config: &Value,
        update: bool,
    ) -> HassResult<ConfigureOutcome> {
        let patch = require_object(component, config)?;
        info!(component = %component, update = update, "Configuring component");

        let (body, merged) = if update {
            match self.get(component).await {
                Ok(current) => (shallow_merge(&current, patch), true),
                // Nothing stored yet: the update degenerates to a create.
                Err(HassError::NotFound(_)) => (Value::Object(patch.clone()), false),
                Err(err) => return Err(err),
            }
        } else {
            (Value::Object(patch.clone()), false)
        };

        let response: Value = self.client.http.post(&component.config_path(), &body).await?;
        let reloaded = self.reload(component.kind()).await?;

        Ok(ConfigureOutcome {
            result: "ok",
            component_type: component.kind(),
            object_id: component.object_id().to_string(),
            merged,
            reloaded,
            response,
        })
    }

    /// Remove `component`. A component that does not exist counts as removed.
    pub async fn delete(&self, component: &ComponentRef) -> HassResult<DeleteOutcome> {
        info!(component = %component, "Deleting component");

        let deleted = match self.client.http.delete_no_response(&component.delete_path()).await {
            Ok(()) => true,
            Err(HassError::NotFound(_)) => {
                warn!(component = %component, "Component already absent");
                false
            }
            Err(err) => return Err(err),
        };

        let reloaded = if deleted {
            self.reload(component.kind()).await?
        } else {
            false
        };

        Ok(DeleteOutcome {
            result: "ok",
            component_type: component.kind(),
            object_id: component.object_id().to_string(),
            deleted,
            reloaded,
        })
    }

    /// Call `<kind>.reload` so a changed configuration takes effect.
    /// Returns `false` for kinds without a reload service.
    pub async fn reload(&self, kind: ComponentKind) -> HassResult<bool> {
        let Some((domain, service)) = kind.reload_service() else {
            return Ok(false);
        };
        self.client
            .services()
            .call(domain, service, Some(&Value::Object(Map::new())))
            .await?;
        Ok(true)
    }
}
