//! Cache-backed resource fetching.
//!
//! Named resource collections are fetched from the remote API through a
//! per-key time-to-live cache held in durable storage (`{key}` for the
//! payload, `{key}_time` for the fetch timestamp in epoch milliseconds).
//! A fresh entry short-circuits the network entirely; a fetch failure
//! leaves any stale entry in place rather than wiping it, so a transient
//! outage never causes a flash of empty state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use storegpt_core::CatalogItem;

use crate::api::{ApiClient, ApiError};
use crate::storage::KeyValueStore;

/// Cache key for the product catalog.
pub const ITEMS_CACHE_KEY: &str = "items_cache";

/// Errors that can occur during a cached fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The response envelope did not contain the expected field.
    #[error("response missing field {0:?}")]
    MissingField(String),

    /// The payload did not deserialize to the requested type.
    #[error("payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An invalidation superseded this call while it was in flight; the
    /// result must be discarded, not applied.
    #[error("fetch superseded")]
    Superseded,
}

/// A named remote collection.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    /// API endpoint path (e.g., `/items/`).
    pub endpoint: String,
    /// Field of the response envelope holding the collection; `None` uses
    /// the whole body.
    pub data_key: Option<String>,
}

impl ResourceDescriptor {
    /// The product catalog resource.
    #[must_use]
    pub fn items() -> Self {
        Self {
            endpoint: "/items/".to_string(),
            data_key: Some("items".to_string()),
        }
    }
}

/// Observable state of an in-flight fetch.
#[derive(Debug, Clone)]
pub enum FetchState<T> {
    /// The request has not resolved yet.
    Loading,
    /// The request succeeded.
    Ready(T),
    /// The request failed; any previously cached data is untouched.
    Failed(String),
}

impl<T> FetchState<T> {
    /// Whether the fetch is still in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Fetches named resources through the storage-backed TTL cache.
#[derive(Clone)]
pub struct CachedFetcher {
    inner: Arc<CachedFetcherInner>,
}

struct CachedFetcherInner {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    default_ttl: Duration,
    /// Bumped by invalidation; snapshots taken before an await are compared
    /// after it so a superseded response is discarded instead of applied.
    epoch: AtomicU64,
}

impl CachedFetcher {
    /// Create a fetcher with a default time-to-live for cached entries.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CachedFetcherInner {
                api,
                storage,
                default_ttl,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Fetch a resource, honoring the cache when `cache_key` is given.
    ///
    /// A non-expired entry (`now - fetched_at < ttl`) is returned without
    /// any network call. On a successful remote fetch the entry is
    /// overwritten; on failure any existing entry is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Superseded` when an invalidation happened while
    /// the request was in flight; the caller must discard the result.
    #[instrument(skip(self), fields(endpoint = %resource.endpoint))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &ResourceDescriptor,
        cache_key: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<T, FetchError> {
        let ttl = ttl.unwrap_or(self.inner.default_ttl);

        if let Some(key) = cache_key
            && let Some(payload) = self.read_fresh_entry(key, ttl)
        {
            debug!(key, "Cache hit");
            return Ok(serde_json::from_value(payload)?);
        }

        let epoch = self.inner.epoch.load(Ordering::Acquire);
        let body = self.inner.api.get_json(&resource.endpoint).await?;

        if self.inner.epoch.load(Ordering::Acquire) != epoch {
            return Err(FetchError::Superseded);
        }

        let payload = match &resource.data_key {
            Some(field) => body
                .get(field)
                .cloned()
                .ok_or_else(|| FetchError::MissingField(field.clone()))?,
            None => body,
        };

        if let Some(key) = cache_key {
            self.write_entry(key, &payload);
        }

        Ok(serde_json::from_value(payload)?)
    }

    /// Fetch the product catalog through the cache.
    ///
    /// # Errors
    ///
    /// See [`CachedFetcher::fetch`].
    pub async fn catalog(&self) -> Result<Vec<CatalogItem>, FetchError> {
        self.fetch(&ResourceDescriptor::items(), Some(ITEMS_CACHE_KEY), None)
            .await
    }

    /// Observe a fetch as a `loading -> ready | failed` state machine.
    ///
    /// The returned channel starts at [`FetchState::Loading`]. If every
    /// receiver is dropped before the request resolves, the result is
    /// discarded rather than applied to already-released state.
    pub fn observe<T>(
        &self,
        resource: ResourceDescriptor,
        cache_key: Option<String>,
        ttl: Option<Duration>,
    ) -> watch::Receiver<FetchState<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(FetchState::Loading);
        let fetcher = self.clone();

        tokio::spawn(async move {
            let state = match fetcher.fetch::<T>(&resource, cache_key.as_deref(), ttl).await {
                Ok(data) => FetchState::Ready(data),
                Err(FetchError::Superseded) => return,
                Err(e) => FetchState::Failed(e.to_string()),
            };
            if tx.is_closed() {
                // Consumer went away while the request was in flight
                return;
            }
            let _ = tx.send(state);
        });

        rx
    }

    /// Drop a cached entry and supersede any in-flight fetch.
    pub fn invalidate(&self, cache_key: &str) {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.storage.remove(cache_key);
        self.inner.storage.remove(&format!("{cache_key}_time"));
    }

    fn read_fresh_entry(&self, key: &str, ttl: Duration) -> Option<serde_json::Value> {
        let raw = self.inner.storage.get(key)?;
        let fetched_at = self
            .inner
            .storage
            .get(&format!("{key}_time"))?
            .parse::<i64>()
            .ok()?;

        let now = chrono::Utc::now().timestamp_millis();
        let age = now.saturating_sub(fetched_at);
        if age >= i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX) {
            // Stale entry stays in place until a successful refetch
            return None;
        }

        match serde_json::from_str(&raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(key, error = %e, "Corrupt cache entry, refetching");
                None
            }
        }
    }

    fn write_entry(&self, key: &str, payload: &serde_json::Value) {
        let now = chrono::Utc::now().timestamp_millis();
        match serde_json::to_string(payload) {
            Ok(raw) => {
                if let Err(e) = self.inner.storage.set(key, &raw) {
                    warn!(key, error = %e, "Failed to write cache entry");
                    return;
                }
                if let Err(e) = self.inner.storage.set(&format!("{key}_time"), &now.to_string()) {
                    warn!(key, error = %e, "Failed to write cache timestamp");
                }
            }
            Err(e) => warn!(key, error = %e, "Failed to serialize cache entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticIdentity;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;

    const TTL: Duration = Duration::from_millis(10_000);

    /// Client pointed at a closed local port: any network attempt fails
    /// fast, which lets tests distinguish cache hits from remote calls.
    fn unreachable_api() -> ApiClient {
        let config = StorefrontConfig {
            api_base_url: "http://127.0.0.1:9/".parse().expect("url"),
            api_token: None,
            cache_ttl: TTL,
            storage_path: None,
        };
        ApiClient::new(&config, Arc::new(StaticIdentity::anonymous()))
    }

    fn seed_cache(storage: &MemoryStore, key: &str, payload: &str, age_ms: i64) {
        // Spin to the start of a fresh millisecond so truncation on the
        // reader's clock cannot age the entry by an extra millisecond.
        let start = chrono::Utc::now().timestamp_millis();
        let mut now = start;
        while now == start {
            now = chrono::Utc::now().timestamp_millis();
        }
        let fetched_at = now - age_ms;
        storage.set(key, payload).expect("set payload");
        storage
            .set(&format!("{key}_time"), &fetched_at.to_string())
            .expect("set time");
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_network() {
        let storage = Arc::new(MemoryStore::new());
        let fetcher = CachedFetcher::new(unreachable_api(), storage.clone(), TTL);
        let resource = ResourceDescriptor {
            endpoint: "/nums/".to_string(),
            data_key: None,
        };

        // Seeded after client construction so its cost doesn't eat the 1ms margin
        seed_cache(&storage, "nums", "[1,2,3]", 9_999);

        let data: Vec<i64> = fetcher
            .fetch(&resource, Some("nums"), Some(TTL))
            .await
            .expect("cache hit");
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_network() {
        let storage = Arc::new(MemoryStore::new());
        seed_cache(&storage, "nums", "[1,2,3]", 10_001);

        let fetcher = CachedFetcher::new(unreachable_api(), storage.clone(), TTL);
        let resource = ResourceDescriptor {
            endpoint: "/nums/".to_string(),
            data_key: None,
        };

        let result = fetcher
            .fetch::<Vec<i64>>(&resource, Some("nums"), Some(TTL))
            .await;
        assert!(matches!(result, Err(FetchError::Api(_))));

        // The stale entry survives the failed refetch
        assert_eq!(storage.get("nums").as_deref(), Some("[1,2,3]"));
    }

    #[tokio::test]
    async fn test_corrupt_entry_falls_through_to_network() {
        let storage = Arc::new(MemoryStore::new());
        seed_cache(&storage, "nums", "{not json", 0);

        let fetcher = CachedFetcher::new(unreachable_api(), storage, TTL);
        let resource = ResourceDescriptor {
            endpoint: "/nums/".to_string(),
            data_key: None,
        };

        let result = fetcher
            .fetch::<Vec<i64>>(&resource, Some("nums"), Some(TTL))
            .await;
        assert!(matches!(result, Err(FetchError::Api(_))));
    }

    #[tokio::test]
    async fn test_invalidate_removes_entries() {
        let storage = Arc::new(MemoryStore::new());
        seed_cache(&storage, "nums", "[1]", 0);

        let fetcher = CachedFetcher::new(unreachable_api(), storage.clone(), TTL);
        fetcher.invalidate("nums");

        assert!(storage.get("nums").is_none());
        assert!(storage.get("nums_time").is_none());
    }

    #[tokio::test]
    async fn test_observe_reports_ready_from_cache() {
        let storage = Arc::new(MemoryStore::new());
        seed_cache(&storage, "nums", "[7]", 0);

        let fetcher = CachedFetcher::new(unreachable_api(), storage, TTL);
        let resource = ResourceDescriptor {
            endpoint: "/nums/".to_string(),
            data_key: None,
        };

        let mut rx = fetcher.observe::<Vec<i64>>(resource, Some("nums".to_string()), Some(TTL));
        assert!(rx.borrow().is_loading());

        rx.changed().await.expect("state update");
        match &*rx.borrow() {
            FetchState::Ready(data) => assert_eq!(data, &vec![7]),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_observe_reports_failure() {
        let storage = Arc::new(MemoryStore::new());
        let fetcher = CachedFetcher::new(unreachable_api(), storage, TTL);
        let resource = ResourceDescriptor {
            endpoint: "/nums/".to_string(),
            data_key: None,
        };

        let mut rx = fetcher.observe::<Vec<i64>>(resource, None, Some(TTL));
        rx.changed().await.expect("state update");
        assert!(matches!(&*rx.borrow(), FetchState::Failed(_)));
    }
}
