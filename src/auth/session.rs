//! Session lifecycle: silent token renewal and teardown
//!
//! Keeps a valid access token available to every screen by renewing it in
//! the background, and tears the session down completely (storage, timer,
//! navigation) when renewal is no longer possible. Renewal failures are
//! never retried; they always resolve to a full logout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;

use super::store::SessionStore;
use crate::models::User;

/// Canonical silent-renewal interval, chosen to sit comfortably under the
/// backend's access-token lifetime.
pub const RENEWAL_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Bound on the refresh round-trip; a hung call counts as a failed renewal.
const RENEWAL_TIMEOUT: Duration = Duration::from_secs(15);

/// Route prefix that requires an authenticated session.
pub const PROTECTED_PREFIX: &str = "/dashboard";

/// Where the client currently "is", and how to send it back to login.
///
/// Ending a session from a protected screen navigates to login; ending it
/// from a public screen must not move the user off content they were
/// allowed to view.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn goto_login(&self);
}

/// Terminal navigator: tracks the active screen path and records a pending
/// return-to-login for the dashboard loop to act on.
pub struct ScreenNavigator {
    path: Mutex<String>,
    login_requested: AtomicBool,
}

impl ScreenNavigator {
    pub fn new() -> Self {
        Self {
            path: Mutex::new("/".to_string()),
            login_requested: AtomicBool::new(false),
        }
    }

    pub fn enter(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
    }

    pub fn login_requested(&self) -> bool {
        self.login_requested.load(Ordering::SeqCst)
    }
}

impl Default for ScreenNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ScreenNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn goto_login(&self) {
        tracing::info!("Session ended, returning to login");
        self.login_requested.store(true, Ordering::SeqCst);
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

type RenewalFuture = Shared<BoxFuture<'static, bool>>;

/// Per-session manager owning the renewal timer and the in-flight renewal
/// guard. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    interval: Duration,
    renewal_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    renewal_in_flight: Mutex<Option<RenewalFuture>>,
}

impl SessionManager {
    pub fn new(
        base_url: String,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_interval(base_url, store, navigator, RENEWAL_INTERVAL)
    }

    pub fn with_interval(
        base_url: String,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                base_url,
                store,
                navigator,
                interval,
                renewal_task: Mutex::new(None),
                renewal_in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.store.access_token()
    }

    /// Schedule silent renewal on a fixed interval. Idempotent: any existing
    /// timer is canceled first, so at most one runs per session. The first
    /// firing is one full interval after the call.
    pub fn start_renewal_loop(&self) {
        let mut slot = self.inner.renewal_task.lock().unwrap();
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let manager = self.clone();
        let interval = self.inner.interval;
        *slot = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if !manager.renew_access_token().await {
                    tracing::warn!("Silent renewal failed, stopping renewal loop");
                    break;
                }
            }
        }));
    }

    /// Cancel the renewal timer. Idempotent; safe when none is running.
    pub fn stop_renewal_loop(&self) {
        if let Some(handle) = self.inner.renewal_task.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn renewal_loop_active(&self) -> bool {
        self.inner
            .renewal_task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Exchange the stored refresh token for a fresh access token. Returns
    /// `false` (after tearing the session down) on any failure: missing
    /// refresh token, rejection, network error, or timeout. Never errors, so
    /// a caller cannot crash a screen by forgetting to handle one.
    ///
    /// Concurrent callers attach to a single in-flight renewal rather than
    /// racing two writers over the stored refresh token.
    pub async fn renew_access_token(&self) -> bool {
        let renewal = {
            let mut guard = self.inner.renewal_in_flight.lock().unwrap();
            match guard.as_ref() {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let manager = self.clone();
                    let renewal: RenewalFuture = async move {
                        let renewed = manager.do_renew().await;
                        manager.inner.renewal_in_flight.lock().unwrap().take();
                        renewed
                    }
                    .boxed()
                    .shared();
                    *guard = Some(renewal.clone());
                    renewal
                }
            }
        };
        renewal.await
    }

    async fn do_renew(&self) -> bool {
        let refresh_token = match self.inner.store.refresh_token() {
            Some(refresh_token) => refresh_token,
            None => {
                tracing::warn!("No refresh token in storage, terminating session");
                self.terminate_session();
                return false;
            }
        };

        tracing::debug!("Renewing access token...");
        let url = format!("{}/api/auth/refresh", self.inner.base_url);
        let response = self
            .inner
            .http
            .post(&url)
            .timeout(RENEWAL_TIMEOUT)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    "Refresh rejected with HTTP {}, terminating session",
                    response.status().as_u16()
                );
                self.terminate_session();
                return false;
            }
            Err(e) => {
                // Fail closed: a network error during renewal logs out
                // rather than looping with stale credentials.
                tracing::warn!("Refresh request failed: {}, terminating session", e);
                self.terminate_session();
                return false;
            }
        };

        match response.json::<RefreshResponse>().await {
            Ok(body) => {
                self.inner
                    .store
                    .store_renewal(body.access_token, body.refresh_token, body.user);
                tracing::debug!("Access token renewed");
                true
            }
            Err(e) => {
                tracing::warn!("Malformed refresh response: {}, terminating session", e);
                self.terminate_session();
                false
            }
        }
    }

    /// Remove the whole session from storage, cancel the renewal timer, and
    /// navigate to login when the user is on a protected screen. Idempotent.
    pub fn terminate_session(&self) {
        self.inner.store.clear_session();
        self.stop_renewal_loop();
        if self.inner.navigator.current_path().starts_with(PROTECTED_PREFIX) {
            self.inner.navigator.goto_login();
        }
    }
}
