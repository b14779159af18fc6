//! Notification endpoints

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::client::ApiClient;

const TTL_NOTIFICATIONS: Duration = Duration::from_secs(60);

const LIST_ENDPOINT: &str = "/api/notifications";

#[derive(Debug, Deserialize)]
struct Notification {
    id: String,
    message: String,
    read: bool,
    #[serde(default)]
    created_at: Option<String>,
}

/// List notifications, optionally marking everything read.
pub async fn list(mark_read: bool) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client.get_cached(LIST_ENDPOINT, TTL_NOTIFICATIONS).await?;
    let notifications: Vec<Notification> =
        serde_json::from_value(value).context("Failed to parse notifications")?;

    if notifications.is_empty() {
        println!("No notifications.");
        return Ok(());
    }

    println!();
    for notification in &notifications {
        println!(
            "{} {}  {}",
            if notification.read { " " } else { "*" },
            notification.created_at.as_deref().unwrap_or(""),
            notification.message,
        );
    }

    if mark_read {
        let unread: Vec<&str> = notifications
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id.as_str())
            .collect();
        if !unread.is_empty() {
            client
                .post("/api/notifications/read", &json!({ "ids": unread }))
                .await?;
            // The cached list now disagrees with the backend.
            client.invalidate(LIST_ENDPOINT);
            println!("\nMarked {} notification(s) read.", unread.len());
        }
    }
    Ok(())
}
