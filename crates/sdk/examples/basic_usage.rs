//! Basic SDK usage example.
//!
//! Connects to Home Assistant, prints the version and a per-domain entity
//! count, then toggles the light named on the command line.
//!
//! Run with: HA_URL=http://localhost:8123 HA_TOKEN=... cargo run --example basic_usage -- light.kitchen

use hassbridge_sdk::{EntityId, HassClient, HassResult};
use std::collections::BTreeMap;
use std::time::Duration;

#[tokio::main]
async fn main() -> HassResult<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let client = HassClient::builder()
        .base_url(std::env::var("HA_URL").unwrap_or_else(|_| "http://localhost:8123".to_string()))
        .token(std::env::var("HA_TOKEN").unwrap_or_default())
        .timeout(Duration::from_secs(10))
        .build()?;

    println!("Home Assistant {}", client.config().version().await?);

    let states = client.states().list().await?;
    let mut per_domain: BTreeMap<&str, usize> = BTreeMap::new();
    for state in &states {
        *per_domain.entry(state.domain()).or_default() += 1;
    }

    println!("\n{} entities:", states.len());
    for (domain, count) in &per_domain {
        println!("  {domain}: {count}");
    }

    if let Some(raw) = std::env::args().nth(1) {
        let entity_id = EntityId::parse(&raw)?;
        let data = serde_json::json!({ "entity_id": entity_id.as_str() });
        client
            .services()
            .call(entity_id.domain(), "toggle", Some(&data))
            .await?;

        let state = client.states().get(&entity_id).await?;
        println!("\n{} is now {}", state.display_name(), state.state);
    }

    Ok(())
}
