//! Authenticated HTTP client for the Discortize API
//!
//! Wraps reqwest::Client with bearer-token injection, a single renew-and-
//! retry on 401, and a TTL response cache for semi-static read endpoints.
//! Screens never handle token expiry themselves; it is owned entirely here
//! and by the session manager.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use super::error::ApiError;
use crate::auth::session::{Navigator, ScreenNavigator, SessionManager};
use crate::auth::store::SessionStore;
use crate::cache::{RequestDeduper, ResponseCache};
use crate::config::{Config, FileStore};

/// API client for one session. Cheap to clone; clones share the cache and
/// the in-flight registry.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionManager,
    cache: ResponseCache,
    deduper: RequestDeduper,
}

impl ApiClient {
    pub fn new(base_url: String, session: SessionManager) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
            cache: ResponseCache::new(),
            deduper: RequestDeduper::new(),
        }
    }

    /// Load the config file and wire up a session manager for a one-shot CLI
    /// invocation.
    pub fn from_config() -> Result<Self> {
        let config = Config::load()?;
        let base_url = config.api_base();
        let store: Arc<dyn SessionStore> = Arc::new(FileStore::new());
        let navigator: Arc<dyn Navigator> = Arc::new(ScreenNavigator::new());
        let session = SessionManager::new(base_url.clone(), store, navigator);
        Ok(Self::new(base_url, session))
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Invalidate one cached read after a mutating call.
    pub fn invalidate(&self, endpoint: &str) {
        self.cache.delete(endpoint);
    }

    /// Issue a bearer-authenticated request. A 401 triggers exactly one
    /// renewal and one retry; a second rejection tears the session down and
    /// surfaces as `SessionExpired`. Never retries beyond that.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        let response = self
            .send(method.clone(), endpoint, body, token.as_deref())
            .await?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return decode_response(response).await;
        }

        tracing::debug!("401 for {}, attempting token renewal", endpoint);
        if !self.session.renew_access_token().await {
            return Err(ApiError::SessionExpired);
        }

        let token = self.session.access_token();
        let response = self.send(method, endpoint, body, token.as_deref()).await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // Renewed token still rejected: terminal, do not loop.
            self.session.terminate_session();
            return Err(ApiError::SessionExpired);
        }
        decode_response(response).await
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Unauthenticated GET for public surfaces (invoice pay page, blog).
    pub async fn get_public(&self, endpoint: &str) -> Result<Value, ApiError> {
        let response = self.send(Method::GET, endpoint, None, None).await?;
        decode_response(response).await
    }

    /// Unauthenticated POST (login, register).
    pub async fn post_public(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let response = self.send(Method::POST, endpoint, Some(body), None).await?;
        decode_response(response).await
    }

    /// GET with bounded-freshness caching. Concurrent identical misses are
    /// collapsed into one network call; each call site picks its own TTL.
    pub async fn get_cached(&self, endpoint: &str, ttl: Duration) -> Result<Value, ApiError> {
        if let Some(hit) = self.cache.get(endpoint) {
            tracing::debug!("cache hit for {}", endpoint);
            return Ok(hit);
        }

        let key = RequestDeduper::key(&Method::GET, endpoint, None);
        let client = self.clone();
        let target = endpoint.to_string();
        let value = self
            .deduper
            .run(key, async move { client.get(&target).await })
            .await?;
        self.cache.set(endpoint, value.clone(), ttl);
        Ok(value)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Decode a response body, mapping non-2xx statuses to `ApiError::Api` with
/// the backend's `detail` message passed through verbatim.
async fn decode_response(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    if status.is_success() {
        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });
    Err(ApiError::Api {
        status: status.as_u16(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::testing::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{header, method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, store: Arc<MemoryStore>) -> ApiClient {
        let navigator: Arc<dyn Navigator> = Arc::new(ScreenNavigator::new());
        let session = SessionManager::new(server.uri(), store, navigator);
        ApiClient::new(server.uri(), session)
    }

    #[tokio::test]
    async fn test_ok_response_passes_through() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/stats/summary"))
            .and(header("Authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 5 })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, store);

        let value = client.get("/api/stats/summary").await.unwrap();
        assert_eq!(value, json!({ "total": 5 }));
    }

    #[tokio::test]
    async fn test_401_renews_once_and_retries_once() {
        let server = MockServer::start().await;
        // Old token rejected, new token accepted.
        Mock::given(http_method("GET"))
            .and(path("/api/payouts"))
            .and(header("Authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(http_method("GET"))
            .and(path("/api/payouts"))
            .and(header("Authorization", "Bearer T2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(http_method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "T2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, Arc::clone(&store));

        let value = client.get("/api/payouts").await.unwrap();
        assert_eq!(value, json!([]));
        assert_eq!(store.access_token().as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_persistent_401_fails_after_exactly_one_retry() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/payouts"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(http_method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "T2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, Arc::clone(&store));

        let err = client.get("/api/payouts").await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        // Second rejection is terminal: session torn down.
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_401_with_failed_renewal_is_session_expired() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/payouts"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(http_method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, Arc::clone(&store));

        let err = client.get("/api/payouts").await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert!(store.access_token().is_none());
    }

    #[tokio::test]
    async fn test_business_error_detail_propagates_verbatim() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/api/payouts"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "detail": "Amount too small" })),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, store);

        let err = client
            .post("/api/payouts", &json!({ "amount": "0" }))
            .await
            .unwrap_err();
        match err {
            ApiError::Api { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Amount too small");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_cached_serves_from_cache_within_ttl() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/discord/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connected": true })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, store);

        for _ in 0..3 {
            let value = client
                .get_cached("/api/discord/status", Duration::from_secs(60))
                .await
                .unwrap();
            assert_eq!(value, json!({ "connected": true }));
        }
    }

    #[tokio::test]
    async fn test_get_cached_collapses_concurrent_misses() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/payouts/balance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(80))
                    .set_body_json(json!({ "balance": "1.5" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, store);

        let (a, b) = tokio::join!(
            client.get_cached("/api/payouts/balance", Duration::from_secs(30)),
            client.get_cached("/api/payouts/balance", Duration::from_secs(30)),
        );
        assert_eq!(a.unwrap(), json!({ "balance": "1.5" }));
        assert_eq!(b.unwrap(), json!({ "balance": "1.5" }));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/notifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::with_session("T1", "R1"));
        let client = client_for(&server, store);

        client
            .get_cached("/api/notifications", Duration::from_secs(60))
            .await
            .unwrap();
        client.invalidate("/api/notifications");
        client
            .get_cached("/api/notifications", Duration::from_secs(60))
            .await
            .unwrap();
    }
}
