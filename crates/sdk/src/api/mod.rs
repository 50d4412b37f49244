//! One API object per area of the Home Assistant REST API.

pub mod components;
pub mod config;
pub mod dashboards;
pub mod entities;
pub mod events;
pub mod history;
pub mod logbook;
pub mod services;
pub mod states;
pub mod system;

pub use components::{ComponentsApi, ConfigureOutcome, DeleteOutcome};
pub use config::{ConfigApi, ConfigCheck, HassConfig};
pub use dashboards::{DashboardChange, DashboardOutcome, DashboardsApi};
pub use entities::{AttributeUpdate, EntitiesApi};
pub use events::{EventListener, EventsApi};
pub use history::HistoryApi;
pub use logbook::LogbookApi;
pub use services::{ServiceDomain, ServicesApi};
pub use states::StatesApi;
pub use system::SystemApi;

use crate::error::{HassError, HassResult};
use hassbridge_core::types::is_path_safe;

/// Checks a single REST path segment supplied by a caller.
pub(crate) fn path_segment<'s>(what: &str, value: &'s str) -> HassResult<&'s str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(HassError::InvalidInput(format!("{what} must not be empty")));
    }
    if !is_path_safe(value) {
        return Err(HassError::InvalidInput(format!(
            "{what} '{value}' contains characters not allowed in a path"
        )));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) fn test_client(uri: &str) -> crate::HassClient {
    crate::HassClient::builder()
        .base_url(uri)
        .token("test-token")
        .build()
        .unwrap()
}
