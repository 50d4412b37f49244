//! # Hassbridge SDK
//!
//! Typed async client for the Home Assistant REST API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hassbridge_sdk::{HassClient, HassResult};
//!
//! #[tokio::main]
//! async fn main() -> HassResult<()> {
//!     // Build client
//!     let client = HassClient::builder()
//!         .base_url("http://homeassistant.local:8123")
//!         .token("your-long-lived-access-token")
//!         .build()?;
//!
//!     // Check version
//!     let version = client.config().version().await?;
//!     println!("Home Assistant {}", version);
//!
//!     // List entities
//!     let states = client.states().list().await?;
//!     println!("Found {} entities", states.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Component configuration
//!
//! ```rust,no_run
//! use hassbridge_sdk::{ComponentKind, ComponentRef, HassClient};
//! use serde_json::json;
//!
//! # async fn example(client: HassClient) -> hassbridge_sdk::HassResult<()> {
//! let automation = ComponentRef::new(ComponentKind::Automation, "morning_lights")?;
//! let outcome = client
//!     .components()
//!     .configure(&automation, &json!({"alias": "Morning lights"}), false)
//!     .await?;
//! println!("reloaded: {}", outcome.reloaded);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

// Re-export main client
pub use client::{HassClient, HassClientBuilder};
pub use config::ClientConfig;
pub use error::{ErrorKind, HassError, HassResult};

// Re-export core types for convenience
pub use hassbridge_core::{
    control::ControlOperation,
    dashboard::{DashboardAction, DashboardRequest},
    types::{ComponentKind, ComponentRef, EntityId, EntityState},
    CoreError,
};
