use anyhow::{bail, Context, Result};
use hassbridge_mcp::{build_server, McpServer};
use hassbridge_sdk::HassClient;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_HA_URL: &str = "http://localhost:8123";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `hassbridge.toml`. Every field is optional; command line
/// arguments and environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub homeassistant: HomeAssistantConfig,

    #[serde(default)]
    pub server: ListenConfig,

    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListenConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Bearer key required on `/mcp`. Unset means no authentication.
    pub api_key: Option<String>,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ha_url: Option<String>,
    pub ha_token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ha_url: String,
    pub ha_token: String,
    pub timeout: Duration,
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub log_level: String,
}

impl Settings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration file")
    }

    /// Apply overrides over file values, then defaults.
    pub fn resolve(self, overrides: Overrides) -> Result<Settings> {
        let Some(ha_token) = non_empty(overrides.ha_token).or(non_empty(self.homeassistant.token))
        else {
            bail!("No Home Assistant token: set HA_TOKEN or homeassistant.token");
        };

        Ok(Settings {
            ha_url: non_empty(overrides.ha_url)
                .or(non_empty(self.homeassistant.url))
                .unwrap_or_else(|| DEFAULT_HA_URL.to_string()),
            ha_token,
            timeout: Duration::from_secs(
                overrides
                    .timeout_secs
                    .or(self.homeassistant.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            host: non_empty(overrides.host)
                .or(non_empty(self.server.host))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(self.server.port).unwrap_or(DEFAULT_PORT),
            api_key: non_empty(overrides.api_key).or(non_empty(self.server.api_key)),
            log_level: non_empty(overrides.log_level)
                .or(non_empty(self.log_level))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<HassClient>,
    pub mcp: Arc<McpServer>,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = HassClient::builder()
            .base_url(&settings.ha_url)
            .token(&settings.ha_token)
            .timeout(settings.timeout)
            .build()
            .context("Failed to create Home Assistant client")?;

        Ok(Self::from_client(client, settings.api_key.clone()))
    }

    pub fn from_client(client: HassClient, api_key: Option<String>) -> Self {
        Self {
            client: Arc::new(client.clone()),
            mcp: Arc::new(build_server(client)),
            api_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file() {
        let config = ServerConfig::parse(
            r#"
            log_level = "debug"

            [homeassistant]
            url = "http://ha.local:8123"
            token = "file-token"

            [server]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.homeassistant.url.as_deref(), Some("http://ha.local:8123"));
        assert_eq!(config.server.port, Some(9000));
        assert!(config.server.api_key.is_none());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = ServerConfig::parse(
            r#"
            [homeassistant]
            url = "http://ha.local:8123"
            token = "file-token"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        let settings = config
            .resolve(Overrides {
                ha_token: Some("env-token".to_string()),
                port: Some(8100),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(settings.ha_token, "env-token");
        assert_eq!(settings.ha_url, "http://ha.local:8123");
        assert_eq!(settings.port, 8100);
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.addr(), "0.0.0.0:8100");
    }

    #[test]
    fn test_token_required() {
        assert!(ServerConfig::default().resolve(Overrides::default()).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/hassbridge.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }
}
