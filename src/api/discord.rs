//! Discord integration endpoints
//!
//! TTLs are tiered by volatility: the OAuth client id is effectively
//! static, per-user connection status changes rarely.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::client::ApiClient;

const TTL_CLIENT_ID: Duration = Duration::from_secs(60 * 60);
const TTL_STATUS: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Deserialize)]
struct ConnectionStatus {
    connected: bool,
    #[serde(default)]
    discord_username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientId {
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct Server {
    id: String,
    name: String,
    #[serde(default)]
    member_count: u64,
    #[serde(default)]
    bot_installed: bool,
}

/// Show the Discord account link status and managed servers. If the account
/// is not linked, print the OAuth connect URL instead.
pub async fn servers() -> Result<()> {
    let client = ApiClient::from_config()?;

    let value = client.get_cached("/api/discord/status", TTL_STATUS).await?;
    let status: ConnectionStatus =
        serde_json::from_value(value).context("Failed to parse connection status")?;

    if !status.connected {
        let value = client
            .get_cached("/api/discord/client-id", TTL_CLIENT_ID)
            .await?;
        let id: ClientId = serde_json::from_value(value).context("Failed to parse client id")?;
        println!("Discord account not linked.");
        println!(
            "Connect it at: https://discord.com/oauth2/authorize?client_id={}&scope=identify+guilds",
            id.client_id
        );
        return Ok(());
    }

    println!(
        "Linked as {}.",
        status.discord_username.as_deref().unwrap_or("(unknown)")
    );

    let value = client.get("/api/discord/servers").await?;
    let servers: Vec<Server> =
        serde_json::from_value(value).context("Failed to parse server list")?;

    if servers.is_empty() {
        println!("No servers with the Discortize bot yet.");
        return Ok(());
    }

    println!();
    for server in servers {
        println!(
            "{}  {}  ({} members{})",
            server.id,
            server.name,
            server.member_count,
            if server.bot_installed {
                ""
            } else {
                ", bot missing"
            },
        );
    }
    Ok(())
}
