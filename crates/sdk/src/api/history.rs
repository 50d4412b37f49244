//! Recorder history endpoints.

use crate::client::HassClient;
use crate::error::{HassError, HassResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hassbridge_core::types::EntityId;
use serde_json::Value;

/// History API.
pub struct HistoryApi<'a> {
    client: &'a HassClient,
}

impl<'a> HistoryApi<'a> {
    pub(crate) fn new(client: &'a HassClient) -> Self {
        Self { client }
    }

    /// Raw `/api/history/period` result: one list of records per entity.
    pub async fn period(
        &self,
        entity_id: &EntityId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> HassResult<Vec<Vec<Value>>> {
        let path = format!("/api/history/period/{}", timestamp(start));
        let mut query = vec![("filter_entity_id", entity_id.to_string())];
        if let Some(end) = end {
            query.push(("end_time", timestamp(end)));
        }

        let history: Option<Vec<Vec<Value>>> = self.client.http.get_with_query(&path, &query).await?;
        Ok(history.unwrap_or_default())
    }

    /// State records of one entity over the last `hours` hours.
    pub async fn recent(&self, entity_id: &EntityId, hours: u32) -> HassResult<Vec<Value>> {
        let (start, end) = window(hours)?;
        let history = self.period(entity_id, start, Some(end)).await?;
        Ok(history.into_iter().next().unwrap_or_default())
    }
}

/// `(now - hours, now)`; fails when the start falls outside the calendar range.
pub(crate) fn window(hours: u32) -> HassResult<(DateTime<Utc>, DateTime<Utc>)> {
    let end = Utc::now();
    let start = end
        .checked_sub_signed(Duration::hours(i64::from(hours)))
        .ok_or_else(|| HassError::InvalidInput(format!("hours {hours} reaches too far back")))?;
    Ok((start, end))
}

/// Timestamp format accepted in history and logbook paths.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
