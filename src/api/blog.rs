//! Public blog endpoints

use anyhow::{Context, Result};
use serde::Deserialize;

use super::client::ApiClient;
use crate::content;

#[derive(Debug, Deserialize)]
struct PostSummary {
    slug: String,
    title: String,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    body: String,
}

/// List published posts.
pub async fn list() -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client.get_public("/api/blog/posts").await?;
    let posts: Vec<PostSummary> =
        serde_json::from_value(value).context("Failed to parse post list")?;

    if posts.is_empty() {
        println!("No posts yet.");
        return Ok(());
    }

    println!();
    for post in posts {
        println!(
            "{}  {}  {}",
            post.published_at.as_deref().unwrap_or(""),
            post.slug,
            post.title,
        );
    }
    Ok(())
}

/// Render one post in the terminal.
pub async fn show(slug: &str) -> Result<()> {
    let client = ApiClient::from_config()?;
    let value = client
        .get_public(&format!("/api/blog/posts/{}", slug))
        .await?;
    let post: Post = serde_json::from_value(value).context("Failed to parse post")?;

    println!();
    println!("{}", post.title);
    println!();
    println!("{}", content::render_terminal(&content::parse_blocks(&post.body)));
    Ok(())
}
