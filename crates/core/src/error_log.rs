use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Home Assistant error log with a few counts pulled out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogReport {
    pub log_text: String,
    pub error_count: usize,
    pub warning_count: usize,
    /// Lowercased `[integration]` tags and how often each appears.
    pub integration_mentions: BTreeMap<String, usize>,
}

fn integration_tag() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"\[([a-zA-Z0-9_]+)\]").ok())
        .as_ref()
}

pub fn analyze(log_text: impl Into<String>) -> ErrorLogReport {
    let log_text = log_text.into();

    let mut integration_mentions = BTreeMap::new();
    if let Some(tag) = integration_tag() {
        for captures in tag.captures_iter(&log_text) {
            if let Some(name) = captures.get(1) {
                *integration_mentions
                    .entry(name.as_str().to_lowercase())
                    .or_insert(0) += 1;
            }
        }
    }

    ErrorLogReport {
        error_count: log_text.matches("ERROR").count(),
        warning_count: log_text.matches("WARNING").count(),
        integration_mentions,
        log_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
2024-03-01 10:00:01.123 ERROR (MainThread) [homeassistant.components.mqtt] Disconnected
2024-03-01 10:00:02.456 WARNING (MainThread) [zwave_js] Node 4 not responding
2024-03-01 10:00:03.789 ERROR (MainThread) [MQTT] Reconnect failed
2024-03-01 10:00:04.000 INFO (MainThread) [zwave_js] Node 4 alive";

    #[test]
    fn test_counts() {
        let report = analyze(LOG);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.log_text, LOG);
    }

    #[test]
    fn test_integration_mentions() {
        let report = analyze(LOG);
        assert_eq!(report.integration_mentions.get("zwave_js"), Some(&2));
        assert_eq!(report.integration_mentions.get("mqtt"), Some(&1));
        // Dotted logger names are not integration tags.
        assert!(!report
            .integration_mentions
            .contains_key("homeassistant.components.mqtt"));
    }

    #[test]
    fn test_empty_log() {
        let report = analyze("");
        assert_eq!(report.error_count, 0);
        assert!(report.integration_mentions.is_empty());
    }
}
