//! Main client for the Home Assistant REST API.

use crate::api::*;
use crate::config::{normalize_base, ClientConfig, DEFAULT_TIMEOUT};
use crate::error::{HassError, HassResult};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client for a single Home Assistant instance. Cheap to clone; clones share
/// the connection pool.
#[derive(Debug, Clone)]
pub struct HassClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl HassClient {
    /// Create a new client builder.
    pub fn builder() -> HassClientBuilder {
        HassClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> HassResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Get the core configuration API.
    pub fn config(&self) -> ConfigApi<'_> {
        ConfigApi::new(self)
    }

    /// Get the states API.
    pub fn states(&self) -> StatesApi<'_> {
        StatesApi::new(self)
    }

    /// Get the services API.
    pub fn services(&self) -> ServicesApi<'_> {
        ServicesApi::new(self)
    }

    /// Get the events API.
    pub fn events(&self) -> EventsApi<'_> {
        EventsApi::new(self)
    }

    /// Get the history API.
    pub fn history(&self) -> HistoryApi<'_> {
        HistoryApi::new(self)
    }

    /// Get the logbook API.
    pub fn logbook(&self) -> LogbookApi<'_> {
        LogbookApi::new(self)
    }

    /// Get the system API (error log, templates, restart).
    pub fn system(&self) -> SystemApi<'_> {
        SystemApi::new(self)
    }

    /// Get the components API (automations, scripts, scenes, dashboards).
    pub fn components(&self) -> ComponentsApi<'_> {
        ComponentsApi::new(self)
    }

    /// Get the entities API.
    pub fn entities(&self) -> EntitiesApi<'_> {
        EntitiesApi::new(self)
    }

    /// Get the dashboards API.
    pub fn dashboards(&self) -> DashboardsApi<'_> {
        DashboardsApi::new(self)
    }
}

/// Builder for creating a HassClient.
pub struct HassClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Duration,
}

impl HassClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL of the Home Assistant instance.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the long-lived access token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> HassResult<HassClient> {
        let base_url_str = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| HassError::Config("base_url is required".to_string()))?;

        let token = self
            .token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| HassError::Config("token is required".to_string()))?;

        let base_url = Url::parse(base_url_str.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(HassError::Config(format!(
                "unsupported URL scheme '{}'",
                base_url.scheme()
            )));
        }

        let config = ClientConfig {
            base_url: normalize_base(base_url),
            token,
            timeout: self.timeout,
        };

        HassClient::from_config(config)
    }
}

impl Default for HassClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
