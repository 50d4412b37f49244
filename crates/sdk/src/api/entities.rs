//! Attribute updates routed through the per-domain control table.

use crate::client::HassClient;
use crate::error::HassResult;
use hassbridge_core::control::{self, ControlOperation};
use hassbridge_core::types::EntityId;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// Entities API.
pub struct EntitiesApi<'a> {
    client: &'a HassClient,
}

/// Result of a successful attribute update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeUpdate {
    pub result: &'static str,
    pub entity_id: String,
    /// `domain.service`, or `state_merge` for the fallback.
    pub operation: String,
    pub attributes: Vec<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub response: Value,
}

impl<'a> EntitiesApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// Change only the named attributes of `entity_id`.
    ///
    /// Mapped domains go through the first service of the domain accepting
    /// all attributes. Other domains have the attributes merged into the
    /// stored state, which leaves the device itself untouched.
    pub async fn set_attributes(
        &self,
        entity_id: &EntityId,
        attributes: &Map<String, Value>,
    ) -> HassResult<AttributeUpdate> {
        let operation = control::resolve(entity_id, attributes)?;
        let current = self.client.states().get(entity_id).await?;
        info!(entity_id = %entity_id, operation = %operation.name(), "Setting attributes");

        let response = match &operation {
            ControlOperation::Service { domain, service } => {
                let payload = control::service_payload(entity_id, attributes);
                self.client.services().call(domain, service, Some(&payload)).await?
            }
            ControlOperation::StateMerge => {
                let merged = control::merge_attributes(&current.attributes, attributes);
                let state = self.client.states().set(entity_id, &current.state, &merged).await?;
                serde_json::to_value(state)?
            }
        };

        Ok(AttributeUpdate {
            result: "ok",
            entity_id: entity_id.to_string(),
            operation: operation.name(),
            attributes: attributes.keys().cloned().collect(),
            response,
        })
    }
}
