//! Payout and balance endpoints
//!
//! The balance read is cached with a short TTL so it never appears stale
//! for more than tens of seconds, and is invalidated as soon as a payout
//! request mutates it.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::client::ApiClient;

/// Balances move with payments; keep them fresh.
const TTL_BALANCE: Duration = Duration::from_secs(30);

const BALANCE_ENDPOINT: &str = "/api/payouts/balance";

#[derive(Debug, Deserialize)]
struct Balance {
    available: String,
    pending: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct Payout {
    id: String,
    amount: String,
    currency: String,
    status: String,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    requested_at: Option<String>,
}

pub(crate) async fn fetch_balance(client: &ApiClient) -> Result<String> {
    let value = client.get_cached(BALANCE_ENDPOINT, TTL_BALANCE).await?;
    let balance: Balance = serde_json::from_value(value).context("Failed to parse balance")?;
    Ok(format!(
        "{} {} available, {} pending",
        balance.available, balance.currency, balance.pending
    ))
}

/// Show the withdrawable balance.
pub async fn balance() -> Result<()> {
    let client = ApiClient::from_config()?;
    println!("{}", fetch_balance(&client).await?);
    Ok(())
}

/// List past payout requests.
pub async fn list(limit: usize) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client.get("/api/payouts").await?;
    let payouts: Vec<Payout> =
        serde_json::from_value(value).context("Failed to parse payout list")?;

    if payouts.is_empty() {
        println!("No payouts yet.");
        return Ok(());
    }

    println!();
    for payout in payouts.iter().take(limit) {
        println!(
            "{}  {:>12} {}  [{}]  {}  {}",
            payout.id,
            payout.amount,
            payout.currency,
            payout.status,
            payout.destination.as_deref().unwrap_or("-"),
            payout.requested_at.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

/// Request a withdrawal to an on-chain address.
pub async fn request(amount: &str, address: &str) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client
        .post(
            "/api/payouts",
            &json!({ "amount": amount, "address": address }),
        )
        .await?;
    // The cached balance is stale the moment the payout is accepted.
    client.invalidate(BALANCE_ENDPOINT);

    let payout: Payout = serde_json::from_value(value).context("Failed to parse payout")?;
    println!(
        "Payout {} requested: {} {} -> {}",
        payout.id,
        payout.amount,
        payout.currency,
        payout.destination.as_deref().unwrap_or(address),
    );
    println!("Status: {}", payout.status);
    Ok(())
}
