//! Live dashboard screen
//!
//! Long-lived view: enters the protected /dashboard route, starts the
//! silent-renewal loop, and refreshes the revenue summary until interrupted
//! or the session terminates. The loop is stopped on every exit path so no
//! timer leaks across screens.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::api::client::ApiClient;
use crate::api::stats;
use crate::auth::session::{Navigator, ScreenNavigator, SessionManager};
use crate::auth::store::SessionStore;
use crate::config::{Config, FileStore};

pub async fn run(refresh_secs: u64) -> Result<()> {
    let config = Config::load()?;
    let base_url = config.api_base();

    let navigator = Arc::new(ScreenNavigator::new());
    navigator.enter("/dashboard");
    let nav: Arc<dyn Navigator> = navigator.clone();
    let store: Arc<dyn SessionStore> = Arc::new(FileStore::new());
    let session = SessionManager::new(base_url.clone(), store, nav);
    let client = ApiClient::new(base_url, session.clone());

    if session.access_token().is_none() {
        println!("Not logged in. Run 'discortize-cli login' first.");
        return Ok(());
    }

    session.start_renewal_loop();
    println!("Dashboard (refreshes every {}s, Ctrl-C to exit)", refresh_secs);

    loop {
        if navigator.login_requested() {
            client.clear_cache();
            println!("Session expired. Run 'discortize-cli login' to sign in again.");
            break;
        }

        match stats::fetch_summary(&client).await {
            Ok(summary) => stats::print_summary(&summary),
            // Terminal: the session manager has already set the navigator
            // flag; the next loop iteration exits.
            Err(e) if e.is_auth_error() => continue,
            // Transient fetch failures surface without forcing logout.
            Err(e) => tracing::warn!("Could not load summary: {}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(refresh_secs)) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop_renewal_loop();
    Ok(())
}
