//! HTTP transport layer for the Home Assistant client.

use crate::config::ClientConfig;
use crate::error::{HassError, HassResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP transport for making API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> HassResult<Self> {
        let mut headers = header::HeaderMap::new();

        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| HassError::Config("Invalid token format".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| HassError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Build a URL for the given path, relative to the configured base.
    fn build_url(&self, path: &str) -> HassResult<url::Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(HassError::InvalidUrl)
    }

    /// Send a request and turn non-success statuses into errors.
    async fn execute(&self, request: RequestBuilder) -> HassResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request to Home Assistant failed");
            HassError::from(e)
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status = status, "Home Assistant returned an error status");
        Err(HassError::from_response(status, &body))
    }

    /// Decode a JSON body. An empty body decodes as `null`.
    async fn read_json<T: DeserializeOwned>(response: Response) -> HassResult<T> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let decoded = if text.trim().is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_str(&text)
        };
        decoded.map_err(|e| HassError::UpstreamRejected {
            status,
            message: format!("undecodable response: {e}"),
        })
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> HassResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute(self.client.get(url)).await?;
        Self::read_json(response).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> HassResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request with query");

        let response = self.execute(self.client.get(url).query(query)).await?;
        Self::read_json(response).await
    }

    /// Execute a GET request returning plain text.
    pub async fn get_text(&self, path: &str) -> HassResult<String> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request (text)");

        let response = self.execute(self.client.get(url)).await?;
        Ok(response.text().await?)
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> HassResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self.execute(self.client.post(url).json(body)).await?;
        Self::read_json(response).await
    }

    /// Execute a POST request returning plain text.
    pub async fn post_text<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> HassResult<String> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request (text)");

        let response = self.execute(self.client.post(url).json(body)).await?;
        Ok(response.text().await?)
    }

    /// Execute a POST request without a response body.
    pub async fn post_no_response<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> HassResult<()> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request (no response)");

        self.execute(self.client.post(url).json(body)).await?;
        Ok(())
    }

    /// Execute a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> HassResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request");

        let response = self.execute(self.client.delete(url)).await?;
        Self::read_json(response).await
    }

    /// Execute a DELETE request without a response body.
    pub async fn delete_no_response(&self, path: &str) -> HassResult<()> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request (no response)");

        self.execute(self.client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
    }

    fn create_config(base_url: &str) -> Arc<ClientConfig> {
        Arc::new(ClientConfig::new(url::Url::parse(base_url).unwrap(), "test-token"))
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API running."})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let result: TestResponse = transport.get("/api/").await.unwrap();
        assert_eq!(result.message, "API running.");
    }

    #[tokio::test]
    async fn test_get_with_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/logbook/2024-03-01T00:00:00Z"))
            .and(query_param("entity_id", "light.kitchen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let result: Vec<Value> = transport
            .get_with_query(
                "/api/logbook/2024-03-01T00:00:00Z",
                &[("entity_id", "light.kitchen")],
            )
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/services/light/turn_on"))
            .and(body_json(json!({"entity_id": "light.kitchen"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let result: Value = transport
            .post("/api/services/light/turn_on", &json!({"entity_id": "light.kitchen"}))
            .await
            .unwrap();
        assert_eq!(result, json!([]));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_null() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/config/automation/config/morning"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let result: Value = transport
            .post("/api/config/automation/config/morning", &json!({}))
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_text_endpoints() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/template"))
            .respond_with(ResponseTemplate::new(200).set_body_string("21.5"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/error_log"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ERROR boom"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let rendered = transport
            .post_text("/api/template", &json!({"template": "{{ 21.5 }}"}))
            .await
            .unwrap();
        assert_eq!(rendered, "21.5");
        assert_eq!(transport.get_text("/api/error_log").await.unwrap(), "ERROR boom");
    }

    #[tokio::test]
    async fn test_error_statuses_map_to_kinds() {
        let server = MockServer::start().await;

        for (status, route) in [(401, "/api/unauthorized"), (404, "/api/missing"), (422, "/api/invalid")] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(status).set_body_json(json!({"message": "nope"})),
                )
                .mount(&server)
                .await;
        }

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let kind = |r: HassResult<Value>| r.unwrap_err().kind();
        assert_eq!(kind(transport.get("/api/unauthorized").await), ErrorKind::NotAuthorized);
        assert_eq!(kind(transport.get("/api/missing").await), ErrorKind::NotFound);
        assert_eq!(kind(transport.get("/api/invalid").await), ErrorKind::UpstreamRejected);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind and drop a listener to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = ClientConfig::new(
            url::Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
            "test-token",
        );
        config.timeout = Duration::from_secs(2);
        let transport = HttpTransport::new(Arc::new(config)).unwrap();

        let result: HassResult<Value> = transport.get("/api/config").await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unreachable);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_upstream_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/states"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();

        let result: HassResult<Vec<Value>> = transport.get("/api/states").await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UpstreamRejected);
    }

    #[tokio::test]
    async fn test_build_url() {
        let transport = HttpTransport::new(create_config("http://localhost:8123")).unwrap();

        let url = transport.build_url("/api/states").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8123/api/states");
    }

    #[tokio::test]
    async fn test_build_url_keeps_path_prefix() {
        let transport = HttpTransport::new(create_config("https://proxy.example.com/ha")).unwrap();

        let url = transport.build_url("/api/states").unwrap();
        assert_eq!(url.as_str(), "https://proxy.example.com/ha/api/states");
    }
}
