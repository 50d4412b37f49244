//! Entity state endpoints.

use crate::client::HassClient;
use crate::error::{HassError, HassResult};
use hassbridge_core::types::{EntityId, EntityState};
use serde_json::{json, Map, Value};

/// States API for reading and writing the state machine.
pub struct StatesApi<'a> {
    client: &'a HassClient,
}

impl<'a> StatesApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// List the states of all entities.
    pub async fn list(&self) -> HassResult<Vec<EntityState>> {
        self.client.http.get("/api/states").await
    }

    /// Get one entity. A 404 is reported as an unknown entity.
    pub async fn get(&self, entity_id: &EntityId) -> HassResult<EntityState> {
        self.client
            .http
            .get(&format!("/api/states/{entity_id}"))
            .await
            .map_err(|err| match err {
                HassError::NotFound(_) => HassError::NotFound(format!("unknown entity {entity_id}")),
                other => other,
            })
    }

    /// Write a state representation. This does not talk to the device.
    pub async fn set(
        &self,
        entity_id: &EntityId,
        state: &str,
        attributes: &Map<String, Value>,
    ) -> HassResult<EntityState> {
        self.client
            .http
            .post(
                &format!("/api/states/{entity_id}"),
                &json!({ "state": state, "attributes": attributes }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use crate::error::ErrorKind;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_and_get() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/states"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"entity_id": "light.kitchen", "state": "on", "attributes": {}},
                {"entity_id": "sensor.temp", "state": "21.5", "attributes": {"unit_of_measurement": "°C"}}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/states/light.kitchen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"entity_id": "light.kitchen", "state": "on", "attributes": {"brightness": 120}}),
            ))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());

        let states = client.states().list().await.unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[1].domain(), "sensor");

        let light = client
            .states()
            .get(&EntityId::parse("light.kitchen").unwrap())
            .await
            .unwrap();
        assert_eq!(light.attributes["brightness"], 120);
    }

    #[tokio::test]
    async fn test_get_unknown_entity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/states/light.ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Entity not found."})))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .states()
            .get(&EntityId::parse("light.ghost").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Not found: unknown entity light.ghost");
    }

    #[tokio::test]
    async fn test_set() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/states/input_text.note"))
            .and(body_json(json!({"state": "hello", "attributes": {"max": 100}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"entity_id": "input_text.note", "state": "hello", "attributes": {"max": 100}}),
            ))
            .mount(&server)
            .await;

        let mut attributes = Map::new();
        attributes.insert("max".to_string(), json!(100));

        let state = test_client(&server.uri())
            .states()
            .set(&EntityId::parse("input_text.note").unwrap(), "hello", &attributes)
            .await
            .unwrap();
        assert_eq!(state.state, "hello");
    }
}
