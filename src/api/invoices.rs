//! Crypto invoice endpoints

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::client::ApiClient;

#[derive(Debug, Deserialize)]
struct Invoice {
    id: String,
    amount: String,
    currency: String,
    status: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicInvoice {
    id: String,
    amount: String,
    currency: String,
    status: String,
    /// Deposit address the payer sends funds to.
    payment_address: String,
    #[serde(default)]
    description: Option<String>,
}

/// List the creator's invoices.
pub async fn list(limit: usize) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client.get("/api/crypto/invoices").await?;
    let invoices: Vec<Invoice> =
        serde_json::from_value(value).context("Failed to parse invoice list")?;

    if invoices.is_empty() {
        println!("No invoices.");
        return Ok(());
    }

    println!();
    for invoice in invoices.iter().take(limit) {
        println!(
            "{}  {:>12} {}  [{}]  {}",
            invoice.id,
            invoice.amount,
            invoice.currency,
            invoice.status,
            invoice.description.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

/// Create a new invoice and print its id and pay link.
pub async fn create(amount: &str, currency: &str, description: Option<&str>) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client
        .post(
            "/api/crypto/invoices",
            &json!({
                "amount": amount,
                "currency": currency,
                "description": description,
            }),
        )
        .await?;
    let invoice: Invoice = serde_json::from_value(value).context("Failed to parse invoice")?;

    println!("Created invoice {}.", invoice.id);
    println!("Pay link: https://discortize.com/pay/{}", invoice.id);
    Ok(())
}

/// Show one invoice.
pub async fn show(invoice_id: &str) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client
        .get(&format!("/api/crypto/invoices/{}", invoice_id))
        .await?;
    let invoice: Invoice = serde_json::from_value(value).context("Failed to parse invoice")?;

    println!();
    println!("Invoice:  {}", invoice.id);
    println!("Amount:   {} {}", invoice.amount, invoice.currency);
    println!("Status:   {}", invoice.status);
    if let Some(description) = invoice.description {
        println!("Note:     {}", description);
    }
    if let Some(created_at) = invoice.created_at {
        println!("Created:  {}", created_at);
    }
    Ok(())
}

/// Public pay surface: show the deposit address for an invoice. Works
/// without a session, matching the shareable pay-link page.
pub async fn pay(invoice_id: &str) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client
        .get_public(&format!("/api/crypto/invoices/{}/public", invoice_id))
        .await?;
    let invoice: PublicInvoice =
        serde_json::from_value(value).context("Failed to parse invoice")?;

    println!();
    if let Some(description) = &invoice.description {
        println!("{}", description);
    }
    println!(
        "Send {} {} to: {}",
        invoice.amount, invoice.currency, invoice.payment_address
    );
    println!("Status: {}", invoice.status);
    println!();
    println!("The invoice is marked paid once the payment is detected on-chain.");
    Ok(())
}
