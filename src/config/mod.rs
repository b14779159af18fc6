//! Configuration and session storage
//!
//! The session (access token, refresh token, user profile) persists in a
//! TOML file under the platform config dir. All reads and writes go through
//! `FileStore`, the sole `SessionStore` implementation used outside tests,
//! so key names and teardown logic live in exactly one place.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::store::SessionStore;
use crate::models::User;

pub const DEFAULT_API_BASE: &str = "https://api.discortize.com";

/// Application configuration and persisted session state.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL override.
    pub api_base: Option<String>,
    /// Short-lived bearer token for API calls.
    pub token: Option<String>,
    /// Longer-lived token exchanged for new access tokens.
    pub refresh_token: Option<String>,
    /// Profile of the signed-in user.
    pub user: Option<User>,
}

impl Config {
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "discortize", "discortize-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    pub fn api_base(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }
}

/// File-backed session store. Each operation is a load-mutate-save round
/// trip; storage failures degrade silently to "not logged in" rather than
/// surfacing as application errors.
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }

    fn update(&self, mutate: impl FnOnce(&mut Config)) {
        match Config::load() {
            Ok(mut config) => {
                mutate(&mut config);
                if let Err(e) = config.save() {
                    tracing::warn!("Failed to persist session: {:#}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to load config: {:#}", e),
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for FileStore {
    fn access_token(&self) -> Option<String> {
        Config::load().ok().and_then(|c| c.token)
    }

    fn refresh_token(&self) -> Option<String> {
        Config::load().ok().and_then(|c| c.refresh_token)
    }

    fn user(&self) -> Option<User> {
        Config::load().ok().and_then(|c| c.user)
    }

    fn store_login(&self, access_token: String, refresh_token: String, user: User) {
        self.update(|config| {
            config.token = Some(access_token);
            config.refresh_token = Some(refresh_token);
            config.user = Some(user);
        });
    }

    fn store_renewal(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        user: Option<User>,
    ) {
        self.update(|config| {
            config.token = Some(access_token);
            if refresh_token.is_some() {
                config.refresh_token = refresh_token;
            }
            if user.is_some() {
                config.user = user;
            }
        });
    }

    fn clear_session(&self) {
        self.update(|config| {
            config.token = None;
            config.refresh_token = None;
            config.user = None;
        });
    }
}
