//! Lovelace dashboard endpoints.

use crate::client::HassClient;
use crate::error::{HassError, HassResult};
use hassbridge_core::dashboard::{DashboardAction, DashboardRequest};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Dashboards API.
pub struct DashboardsApi<'a> {
    client: &'a HassClient,
}

/// Confirmation of a dashboard change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardChange {
    pub result: &'static str,
    pub action: DashboardAction,
    /// `None` for the default dashboard.
    pub dashboard_id: Option<String>,
    /// Document written, for create and update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// For delete: `false` when the dashboard did not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DashboardOutcome {
    /// Stored document, returned unmodified by `get`.
    Document(Value),
    Changed(DashboardChange),
}

/// REST path of a dashboard's configuration document.
fn config_path(dashboard_id: Option<&str>) -> String {
    match dashboard_id {
        Some(id) => format!("/api/lovelace/dashboards/{id}/config"),
        None => "/api/lovelace/config".to_string(),
    }
}

impl<'a> DashboardsApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// List registered dashboards. The default dashboard is not included.
    pub async fn list(&self) -> HassResult<Vec<Value>> {
        let dashboards: Option<Vec<Value>> = self.client.http.get("/api/lovelace/dashboards").await?;
        Ok(dashboards.unwrap_or_default())
    }

    /// Stored configuration of a dashboard, or of the default one.
    pub async fn get(&self, dashboard_id: Option<&str>) -> HassResult<Value> {
        self.client.http.get(&config_path(dashboard_id)).await
    }

    /// Register a dashboard and write its initial configuration.
    pub async fn create(&self, request: &DashboardRequest) -> HassResult<DashboardChange> {
        request.validate(DashboardAction::Create)?;

        let url_path = request.url_path();
        info!(url_path = %url_path, "Creating dashboard");
        let registered: Value = self
            .client
            .http
            .post("/api/lovelace/dashboards", &request.registration(&url_path))
            .await?;

        let dashboard_id = registered
            .get("url_path")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(url_path);

        let config = request.initial_config();
        self.client
            .http
            .post_no_response(&config_path(Some(&dashboard_id)), &config)
            .await?;

        Ok(DashboardChange {
            result: "ok",
            action: DashboardAction::Create,
            dashboard_id: Some(dashboard_id),
            config: Some(config),
            deleted: None,
        })
    }

    /// Replace the configuration, or merge title, views and resources into it.
    pub async fn update(&self, request: &DashboardRequest) -> HassResult<DashboardChange> {
        request.validate(DashboardAction::Update)?;

        let dashboard_id = request.id();
        let path = config_path(dashboard_id);
        info!(dashboard = dashboard_id.unwrap_or("default"), "Updating dashboard");

        let config = if request.config.is_some() {
            request.updated_config(&Value::Null)
        } else {
            let current = match self.client.http.get::<Value>(&path).await {
                Ok(current) => current,
                // Auto-generated dashboards have no stored document yet.
                Err(HassError::NotFound(_)) => Value::Null,
                Err(err) => return Err(err),
            };
            request.updated_config(&current)
        };

        self.client.http.post_no_response(&path, &config).await?;

        Ok(DashboardChange {
            result: "ok",
            action: DashboardAction::Update,
            dashboard_id: dashboard_id.map(str::to_string),
            config: Some(config),
            deleted: None,
        })
    }

    /// Remove a registered dashboard. A missing dashboard counts as removed.
    pub async fn delete(&self, request: &DashboardRequest) -> HassResult<DashboardChange> {
        request.validate(DashboardAction::Delete)?;

        let dashboard_id = request.id().unwrap_or_default().to_string();
        info!(dashboard = %dashboard_id, "Deleting dashboard");

        let deleted = match self
            .client
            .http
            .delete_no_response(&format!("/api/lovelace/dashboards/{dashboard_id}"))
            .await
        {
            Ok(()) => true,
            Err(HassError::NotFound(_)) => {
                warn!(dashboard = %dashboard_id, "Dashboard already absent");
                false
            }
            Err(err) => return Err(err),
        };

        Ok(DashboardChange {
            result: "ok",
            action: DashboardAction::Delete,
            dashboard_id: Some(dashboard_id),
            config: None,
            deleted: Some(deleted),
        })
    }

    /// Dispatch on `action`.
    pub async fn manage(
        &self,
        action: DashboardAction,
        request: &DashboardRequest,
    ) -> HassResult<DashboardOutcome> {
        match action {
            DashboardAction::Get => {
                request.validate(DashboardAction::Get)?;
                Ok(DashboardOutcome::Document(self.get(request.id()).await?))
            }
            DashboardAction::Create => Ok(DashboardOutcome::Changed(self.create(request).await?)),
            DashboardAction::Update => Ok(DashboardOutcome::Changed(self.update(request).await?)),
            DashboardAction::Delete => Ok(DashboardOutcome::Changed(self.delete(request).await?)),
        }
    }
}
