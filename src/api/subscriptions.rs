//! Role-gated subscription endpoints

use anyhow::{Context, Result};
use serde::Deserialize;

use super::client::ApiClient;

#[derive(Debug, Deserialize)]
struct SubscriptionTier {
    id: String,
    name: String,
    price: String,
    currency: String,
    /// Billing period, e.g. "monthly".
    period: String,
    /// Discord role granted while the subscription is active.
    role_name: String,
    #[serde(default)]
    subscriber_count: u64,
}

/// List subscription tiers and their subscriber counts.
pub async fn list() -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client.get("/api/subscriptions").await?;
    let tiers: Vec<SubscriptionTier> =
        serde_json::from_value(value).context("Failed to parse subscription tiers")?;

    if tiers.is_empty() {
        println!("No subscription tiers. Create one from the web dashboard.");
        return Ok(());
    }

    println!();
    for tier in tiers {
        println!(
            "{}  {}: {} {} / {}  (role: {}, {} subscribers)",
            tier.id,
            tier.name,
            tier.price,
            tier.currency,
            tier.period,
            tier.role_name,
            tier.subscriber_count,
        );
    }
    Ok(())
}
