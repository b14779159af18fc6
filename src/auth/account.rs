//! Account commands: login, register, logout, status, whoami
//!
//! Email/password authentication against the backend auth endpoints. A
//! successful login writes the whole session (token, refresh token, user)
//! to storage in one step.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use super::store::SessionStore;
use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::config::FileStore;
use crate::models::User;

#[derive(Deserialize)]
struct AuthResponse {
    access_token: String,
    refresh_token: String,
    user: User,
}

async fn authenticate(
    client: &ApiClient,
    store: &dyn SessionStore,
    endpoint: &str,
    body: serde_json::Value,
) -> Result<User, ApiError> {
    let value = client.post_public(endpoint, &body).await?;
    let auth: AuthResponse = serde_json::from_value(value)?;
    store.store_login(auth.access_token, auth.refresh_token, auth.user.clone());
    Ok(auth.user)
}

pub(crate) async fn login_with(
    client: &ApiClient,
    store: &dyn SessionStore,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    authenticate(
        client,
        store,
        "/api/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

pub(crate) async fn register_with(
    client: &ApiClient,
    store: &dyn SessionStore,
    email: &str,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    authenticate(
        client,
        store,
        "/api/auth/register",
        json!({ "email": email, "username": username, "password": password }),
    )
    .await
}

/// Sign in and persist the session.
pub async fn login(email: &str, password: &str) -> Result<()> {
    let client = ApiClient::from_config()?;
    tracing::info!("Logging in as {}...", email);
    let user = login_with(&client, &FileStore::new(), email, password).await?;
    println!("Logged in as {}.", user.username);
    Ok(())
}

/// Create an account and persist the resulting session.
pub async fn register(email: &str, username: &str, password: &str) -> Result<()> {
    let client = ApiClient::from_config()?;
    tracing::info!("Registering {}...", email);
    let user = register_with(&client, &FileStore::new(), email, username, password).await?;
    if user.email_verified {
        println!("Account created. Logged in as {}.", user.username);
    } else {
        println!(
            "Account created. Check {} for a verification link.",
            user.email.as_deref().unwrap_or("your inbox")
        );
    }
    Ok(())
}

/// Clear stored credentials and cached responses.
pub async fn logout() -> Result<()> {
    let client = ApiClient::from_config()?;
    client.session().terminate_session();
    client.clear_cache();
    println!("Logged out.");
    Ok(())
}

/// Display current session status.
pub async fn status() -> Result<()> {
    let store = FileStore::new();

    match store.access_token() {
        Some(_) => println!("Access token:  present"),
        None => println!("Access token:  none"),
    }
    match store.refresh_token() {
        Some(_) => println!("Refresh token: present"),
        None => println!("Refresh token: none"),
    }
    match store.user() {
        Some(user) => println!("Signed in as:  {}", user.username),
        None => println!("Signed in as:  (nobody)"),
    }

    if store.access_token().is_none() {
        println!("\nRun 'discortize-cli login' to authenticate.");
    }

    Ok(())
}

/// Show the stored user profile.
pub async fn whoami() -> Result<()> {
    let store = FileStore::new();
    let Some(user) = store.user() else {
        println!("Not logged in. Run 'discortize-cli login' first.");
        return Ok(());
    };

    println!();
    println!("Username: {}", user.username);
    println!("Email:    {}", user.email.as_deref().unwrap_or("(none)"));
    println!(
        "Verified: {}",
        if user.email_verified { "yes" } else { "no" }
    );
    println!("ID:       {}", user.id);
    if let Some(created_at) = user.created_at {
        println!("Since:    {}", created_at);
    }

    Ok(())
}
