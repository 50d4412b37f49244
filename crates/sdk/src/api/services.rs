//! Service endpoints.

use crate::api::path_segment;
use crate::client::HassClient;
use crate::error::HassResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Services API.
pub struct ServicesApi<'a> {
    client: &'a HassClient,
}

impl<'a> ServicesApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// List available services per domain.
    pub async fn list(&self) -> HassResult<Vec<ServiceDomain>> {
        self.client.http.get("/api/services").await
    }

    /// Call `domain.service`. Returns the states that changed while the
    /// service ran, as reported by Home Assistant.
    pub async fn call(&self, domain: &str, service: &str, data: Option<&Value>) -> HassResult<Value> {
        let domain = path_segment("domain", domain)?;
        let service = path_segment("service", service)?;
        info!(domain = domain, service = service, "Calling service");

        let empty = Value::Object(Map::new());
        self.client
            .http
            .post(
                &format!("/api/services/{domain}/{service}"),
                data.unwrap_or(&empty),
            )
            .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDomain {
    pub domain: String,
    #[serde(default)]
    pub services: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use crate::api::test_client;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"domain": "light", "services": {"turn_on": {}, "turn_off": {}}}
            ])))
            .mount(&server)
            .await;

        let domains = test_client(&server.uri()).services().list().await.unwrap();
        assert_eq!(domains[0].domain, "light");
        assert!(domains[0].services.contains_key("turn_off"));
    }

    #[tokio::test]
    async fn test_call_without_data_sends_empty_object() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/services/automation/reload"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(&server.uri())
            .services()
            .call("automation", "reload", None)
            .await
            .unwrap();
        assert_eq!(result, json!([]));
    }

    #[tokio::test]
    async fn test_call_rejects_bad_segments() {
        let client = test_client("http://127.0.0.1:9");
        let err = client
            .services()
            .call("light", "turn_on/../../x", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
