//! Configuration types for the Home Assistant client.

use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Home Assistant client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Home Assistant instance, always ending in `/`.
    pub base_url: Url,
    /// Long-lived access token.
    pub token: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the default timeout.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base(base_url),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Ensure the path ends with `/` so relative joins keep any path prefix
/// (Home Assistant behind a reverse proxy at `/ha`, for instance).
pub(crate) fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_new() {
        let url = Url::parse("http://homeassistant.local:8123").unwrap();
        let config = ClientConfig::new(url, "token");

        assert_eq!(config.base_url.as_str(), "http://homeassistant.local:8123/");
        assert_eq!(config.token, "token");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_normalize_keeps_prefix() {
        let url = Url::parse("https://proxy.example.com/ha").unwrap();
        assert_eq!(normalize_base(url).as_str(), "https://proxy.example.com/ha/");

        let url = Url::parse("https://proxy.example.com/ha/").unwrap();
        assert_eq!(normalize_base(url).as_str(), "https://proxy.example.com/ha/");
    }
}
