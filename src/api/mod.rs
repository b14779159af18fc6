//! API client module for the Discortize backend

mod blog;
pub mod client;
mod discord;
pub mod error;
mod invoices;
mod notifications;
mod payouts;
pub(crate) mod stats;
mod subscriptions;

use anyhow::Result;

/// List the creator's invoices
pub async fn list_invoices(limit: usize) -> Result<()> {
    invoices::list(limit).await
}

/// Create a new invoice
pub async fn create_invoice(amount: &str, currency: &str, description: Option<&str>) -> Result<()> {
    invoices::create(amount, currency, description).await
}

/// Show one invoice
pub async fn show_invoice(invoice_id: &str) -> Result<()> {
    invoices::show(invoice_id).await
}

/// Show the public payment details for an invoice (no session required)
pub async fn pay_invoice(invoice_id: &str) -> Result<()> {
    invoices::pay(invoice_id).await
}

/// List subscription tiers
pub async fn list_subscriptions() -> Result<()> {
    subscriptions::list().await
}

/// Show the withdrawable balance
pub async fn balance() -> Result<()> {
    payouts::balance().await
}

/// List past payouts
pub async fn list_payouts(limit: usize) -> Result<()> {
    payouts::list(limit).await
}

/// Request a withdrawal
pub async fn request_payout(amount: &str, address: &str) -> Result<()> {
    payouts::request(amount, address).await
}

/// Show the revenue summary
pub async fn stats_summary() -> Result<()> {
    stats::summary().await
}

/// Show Discord link status and managed servers
pub async fn discord_servers() -> Result<()> {
    discord::servers().await
}

/// List notifications
pub async fn list_notifications(mark_read: bool) -> Result<()> {
    notifications::list(mark_read).await
}

/// List blog posts
pub async fn list_posts() -> Result<()> {
    blog::list().await
}

/// Render one blog post
pub async fn show_post(slug: &str) -> Result<()> {
    blog::show(slug).await
}
