//! Core configuration endpoints.

use crate::client::HassClient;
use crate::error::HassResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Core configuration API.
pub struct ConfigApi<'a> {
    client: &'a HassClient,
}

impl<'a> ConfigApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// Get the core configuration.
    pub async fn get(&self) -> HassResult<HassConfig> {
        self.client.http.get("/api/config").await
    }

    /// Get the running Home Assistant version.
    pub async fn version(&self) -> HassResult<String> {
        let config = self.get().await?;
        Ok(config.version.unwrap_or_else(|| "unknown".to_string()))
    }

    /// Run the configuration check. Only available with the config integration.
    pub async fn check(&self) -> HassResult<ConfigCheck> {
        self.client
            .http
            .post("/api/config/core/check_config", &Value::Object(Map::new()))
            .await
    }
}

/// Subset of `/api/config`; everything else is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HassConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigCheck {
    /// `valid` or `invalid`.
    pub result: String,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub warnings: Option<Value>,
}

impl ConfigCheck {
    pub fn is_valid(&self) -> bool {
        self.result == "valid"
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "2024.3.0",
                "location_name": "Home",
                "time_zone": "Europe/Berlin",
                "components": ["light", "automation"],
                "unit_system": {"temperature": "°C"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());

        assert_eq!(client.config().version().await.unwrap(), "2024.3.0");
        let config = client.config().get().await.unwrap();
        assert_eq!(config.components.len(), 2);
        assert_eq!(config.extra["unit_system"]["temperature"], "°C");
    }

    #[tokio::test]
    async fn test_check() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/config/core/check_config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": "valid", "errors": null})),
            )
            .mount(&server)
            .await;

        let check = test_client(&server.uri()).config().check().await.unwrap();
        assert!(check.is_valid());
        assert_eq!(check.errors, None);
    }
}
