//! Revenue statistics endpoints

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use super::client::ApiClient;
use super::error::ApiError;

/// Financial summaries must never appear stale for long.
const TTL_SUMMARY: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub(crate) struct Summary {
    pub revenue_total: String,
    pub revenue_month: String,
    pub currency: String,
    pub active_subscribers: u64,
    pub open_invoices: u64,
}

pub(crate) async fn fetch_summary(client: &ApiClient) -> Result<Summary, ApiError> {
    let value = client.get_cached("/api/stats/summary", TTL_SUMMARY).await?;
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn print_summary(summary: &Summary) {
    println!(
        "Revenue: {} {} total, {} this month | {} active subscribers | {} open invoices",
        summary.revenue_total,
        summary.currency,
        summary.revenue_month,
        summary.active_subscribers,
        summary.open_invoices,
    );
}

/// Show the revenue summary.
pub async fn summary() -> Result<()> {
    let client = ApiClient::from_config()?;
    let summary = fetch_summary(&client).await?;
    println!();
    print_summary(&summary);
    Ok(())
}
