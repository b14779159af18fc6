//! In-memory TTL response cache and in-flight request deduplication
//!
//! The cache is policy-free: every call site picks its own TTL. Entries
//! expire lazily on read; nothing sweeps in the background. Cache operations
//! never fail; a degraded cache only means more network calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use crate::api::error::ApiError;

/// Thread-safe response cache with per-entry TTL expiration.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Cached value, or `None` once the entry's TTL has elapsed. Expired
    /// entries are dropped on read.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Store a value, unconditionally replacing any prior entry.
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Drop one entry; no-op when absent. Used to invalidate a read after a
    /// mutating call.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop everything. Called on logout so a new session never observes
    /// another session's cached reads.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

type InFlight = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

/// Collapses concurrent identical requests into a single network call.
///
/// Registrations are removed unconditionally once the underlying call
/// settles, so later calls always hit the network again.
#[derive(Clone)]
pub struct RequestDeduper {
    in_flight: Arc<DashMap<String, InFlight>>,
}

impl RequestDeduper {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Composite key from the request line and a stable serialization of the
    /// body.
    pub fn key(method: &reqwest::Method, url: &str, body: Option<&Value>) -> String {
        match body {
            Some(body) => format!("{} {} {}", method, url, body),
            None => format!("{} {}", method, url),
        }
    }

    /// Run `fut` under `key`, or attach to an already-outstanding call with
    /// the same key and observe its result.
    pub async fn run<F>(&self, key: String, fut: F) -> Result<Value, ApiError>
    where
        F: std::future::Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        use dashmap::mapref::entry::Entry;

        let shared = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(outstanding) => outstanding.get().clone(),
            Entry::Vacant(slot) => {
                let registry = Arc::clone(&self.in_flight);
                let shared = async move {
                    let result = fut.await;
                    registry.remove(&key);
                    result
                }
                .boxed()
                .shared();
                slot.insert(shared.clone());
                shared
            }
        };
        shared.await
    }
}

impl Default for RequestDeduper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;

    #[test]
    fn test_get_before_ttl() {
        let cache = ResponseCache::new();
        cache.set("k", json!({"a": 1}), Duration::from_millis(100));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_get_after_ttl_expiry() {
        let cache = ResponseCache::new();
        cache.set("k", json!("v"), Duration::from_millis(100));
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1), Duration::from_secs(60));
        cache.set("k", json!(2), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_delete_is_noop_when_absent() {
        let cache = ResponseCache::new();
        cache.delete("missing");
        cache.set("k", json!(1), Duration::from_secs(60));
        cache.delete("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let cache = ResponseCache::new();
        cache.set("a", json!(1), Duration::from_secs(60));
        cache.set("b", json!(2), Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_dedup_key_includes_body() {
        let get = RequestDeduper::key(&reqwest::Method::GET, "http://x/api/stats", None);
        let post = RequestDeduper::key(
            &reqwest::Method::POST,
            "http://x/api/stats",
            Some(&json!({"n": 1})),
        );
        assert_eq!(get, "GET http://x/api/stats");
        assert_ne!(get, post);
    }

    #[tokio::test]
    async fn test_dedup_collapses_concurrent_calls() {
        let deduper = RequestDeduper::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!("result"))
        };

        let (a, b) = tokio::join!(
            deduper.run("k".into(), fetch(Arc::clone(&calls))),
            deduper.run("k".into(), fetch(Arc::clone(&calls))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), json!("result"));
        assert_eq!(b.unwrap(), json!("result"));
    }

    #[test]
    fn test_dedup_unregisters_after_settle() {
        tokio_test::block_on(async {
            let deduper = RequestDeduper::new();
            let calls = Arc::new(AtomicUsize::new(0));

            for _ in 0..2 {
                let calls = Arc::clone(&calls);
                let result = deduper
                    .run("k".into(), async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(json!(true))
                    })
                    .await;
                assert!(result.is_ok());
            }

            // Sequential calls each hit the network.
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        });
    }

    #[tokio::test]
    async fn test_dedup_shares_failures_then_retries() {
        let deduper = RequestDeduper::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(ApiError::Http("connection reset".into()))
            }
        };

        let (a, b) = tokio::join!(
            deduper.run("k".into(), failing),
            deduper.run("k".into(), async { Ok(json!("never runs")) }),
        );
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The failed registration is gone; a fresh call runs its own future.
        let ok = deduper.run("k".into(), async { Ok(json!("fresh")) }).await;
        assert_eq!(ok.unwrap(), json!("fresh"));
    }
}
