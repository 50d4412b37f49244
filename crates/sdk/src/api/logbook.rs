//! Logbook endpoints.

use crate::api::history::{timestamp, window};
use crate::client::HassClient;
use crate::error::HassResult;
use chrono::{DateTime, Utc};
use hassbridge_core::types::EntityId;
use serde_json::Value;

/// Logbook API.
pub struct LogbookApi<'a> {
    client: &'a HassClient,
}

impl<'a> LogbookApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// Logbook entries since `start`, optionally for a single entity.
    pub async fn entries(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        entity_id: Option<&EntityId>,
    ) -> HassResult<Vec<Value>> {
        let path = format!("/api/logbook/{}", timestamp(start));
        let mut query = Vec::new();
        if let Some(entity_id) = entity_id {
            query.push(("entity_id", entity_id.to_string()));
        }
        if let Some(end) = end {
            query.push(("end_time", timestamp(end)));
        }

        let entries: Option<Vec<Value>> = self.client.http.get_with_query(&path, &query).await?;
        Ok(entries.unwrap_or_default())
    }

    /// Entries of the last `hours` hours.
    pub async fn recent(&self, hours: u32, entity_id: Option<&EntityId>) -> HassResult<Vec<Value>> {
        let (start, end) = window(hours)?;
        self.entries(start, Some(end), entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_entries_for_entity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/logbook/2024-03-01T00:00:00Z"))
            .and(query_param("entity_id", "light.kitchen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Kitchen", "message": "turned on", "entity_id": "light.kitchen"}
            ])))
            .mount(&server)
            .await;

        let entries = test_client(&server.uri())
            .logbook()
            .entries(
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                None,
                Some(&EntityId::parse("light.kitchen").unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["message"], "turned on");
    }
}
