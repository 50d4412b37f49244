// Environment configuration for the stdio bridge

use anyhow::{bail, Context, Result};
use hassbridge_sdk::HassClient;
use std::time::Duration;

pub const DEFAULT_HA_URL: &str = "http://localhost:8123";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub ha_url: String,
    pub ha_token: String,
    pub timeout: Duration,
    pub log_level: String,
}

impl BridgeConfig {
    /// Load `.env` if present, then read `HA_URL`, `HA_TOKEN`,
    /// `HA_TIMEOUT_SECS` and `LOG_LEVEL`.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let Some(ha_token) = non_empty("HA_TOKEN") else {
            bail!("HA_TOKEN is not set; create a long-lived access token in your Home Assistant profile");
        };

        let timeout_secs = match non_empty("HA_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("HA_TIMEOUT_SECS must be a number of seconds, got '{}'", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            ha_url: non_empty("HA_URL").unwrap_or_else(|| DEFAULT_HA_URL.to_string()),
            ha_token,
            timeout: Duration::from_secs(timeout_secs),
            log_level: non_empty("LOG_LEVEL")
                .map(|l| l.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    pub fn client(&self) -> Result<HassClient> {
        HassClient::builder()
            .base_url(&self.ha_url)
            .token(&self.ha_token)
            .timeout(self.timeout)
            .build()
            .context("Failed to create Home Assistant client")
    }
}
