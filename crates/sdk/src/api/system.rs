//! Error log, template rendering and restart.

use crate::client::HassClient;
use crate::error::{HassError, HassResult};
use serde_json::{json, Map, Value};
use tracing::warn;

/// System API.
pub struct SystemApi<'a> {
    client: &'a HassClient,
}

impl<'a> SystemApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// Raw text of `home-assistant.log`.
    pub async fn error_log(&self) -> HassResult<String> {
        self.client.http.get_text("/api/error_log").await
    }

    /// Render a Jinja template on the server.
    pub async fn render_template(
        &self,
        template: &str,
        variables: Option<&Map<String, Value>>,
    ) -> HassResult<String> {
        if template.trim().is_empty() {
            return Err(HassError::InvalidInput("template must not be empty".to_string()));
        }

        let mut body = json!({ "template": template });
        if let (Some(variables), Some(map)) = (variables, body.as_object_mut()) {
            map.insert("variables".to_string(), Value::Object(variables.clone()));
        }
        self.client.http.post_text("/api/template", &body).await
    }

    /// Restart Home Assistant.
    pub async fn restart(&self) -> HassResult<Value> {
        warn!("Requesting Home Assistant restart");
        self.client
            .services()
            .call("homeassistant", "restart", None)
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
    async fn test_render_template_with_variables() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/template"))
            .and(body_json(json!({"template": "{{ name }} is home", "variables": {"name": "Ada"}})))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ada is home"))
            .mount(&server)
            .await;

        let mut variables = Map::new();
        variables.insert("name".to_string(), json!("Ada"));

        let rendered = test_client(&server.uri())
            .system()
            .render_template("{{ name }} is home", Some(&variables))
            .await
            .unwrap();
        assert_eq!(rendered, "Ada is home");
    }

    #[tokio::test]
    async fn test_render_template_error_is_upstream_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/template"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"message": "Error rendering template: UndefinedError: 'foo' is undefined"}),
            ))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .system()
            .render_template("{{ foo.bar }}", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamRejected);
    }

    #[tokio::test]
    async fn test_error_log_and_restart() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/error_log"))
            .respond_with(ResponseTemplate::new(200).set_body_string("WARNING (MainThread) [hue] slow"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/services/homeassistant/restart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.system().error_log().await.unwrap().contains("[hue]"));
        client.system().restart().await.unwrap();
    }
}
