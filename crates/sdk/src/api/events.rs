//! Event bus endpoints.

use crate::api::path_segment;
use crate::client::HassClient;
use crate::error::HassResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Events API.
pub struct EventsApi<'a> {
    client: &'a HassClient,
}

impl<'a> EventsApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// List event types with their listener counts.
    pub async fn list(&self) -> HassResult<Vec<EventListener>> {
        self.client.http.get("/api/events").await
    }

    /// Fire an event on the bus.
    pub async fn fire(&self, event_type: &str, data: Option<&Value>) -> HassResult<Value> {
        let event_type = path_segment("event_type", event_type)?;
        let empty = Value::Object(Map::new());
        self.client
            .http
            .post(&format!("/api/events/{event_type}"), data.unwrap_or(&empty))
            .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListener {
    pub event: String,
    pub listener_count: u64,
}

#[cfg(test)]
mod tests {
    use crate::api::test_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_and_fire() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"event": "state_changed", "listener_count": 5}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/events/doorbell_pressed"))
            .and(body_json(json!({"door": "front"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Event doorbell_pressed fired."})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());

        let events = client.events().list().await.unwrap();
        assert_eq!(events[0].listener_count, 5);

        let fired = client
            .events()
            .fire("doorbell_pressed", Some(&json!({"door": "front"})))
            .await
            .unwrap();
        assert_eq!(fired["message"], "Event doorbell_pressed fired.");
    }
}
