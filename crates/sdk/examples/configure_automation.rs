//! Component configuration example.
//!
//! Creates an automation, reads it back, renames it with a merge update and
//! finally deletes it again.
//!
//! Run with: HA_URL=http://localhost:8123 HA_TOKEN=... cargo run --example configure_automation

use hassbridge_sdk::{ComponentKind, ComponentRef, HassClient, HassResult};
use serde_json::json;

#[tokio::main]
async fn main() -> HassResult<()> {
    tracing_subscriber::fmt::init();

    let client = HassClient::builder()
        .base_url(std::env::var("HA_URL").unwrap_or_else(|_| "http://localhost:8123".to_string()))
        .token(std::env::var("HA_TOKEN").unwrap_or_default())
        .build()?;

    let automation = ComponentRef::new(ComponentKind::Automation, "sdk_example_sunset")?;

    let config = json!({
        "alias": "SDK example: porch light at sunset",
        "trigger": [{"platform": "sun", "event": "sunset"}],
        "action": [{"service": "light.turn_on", "target": {"entity_id": "light.porch"}}],
        "mode": "single"
    });

    println!("Creating {automation}...");
    let created = client.components().configure(&automation, &config, false).await?;
    println!("  reloaded: {}", created.reloaded);

    let stored = client.components().get(&automation).await?;
    println!("Stored alias: {}", stored["alias"]);

    println!("Renaming...");
    client
        .components()
        .configure(&automation, &json!({"alias": "SDK example: sunset"}), true)
        .await?;

    println!("Deleting...");
    let deleted = client.components().delete(&automation).await?;
    println!("  deleted: {}", deleted.deleted);

    Ok(())
}
