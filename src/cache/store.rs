//! Two-tier read-through / write-through cache

use super::keys::CacheKey;
use super::local::{build_local_cache, LocalCache, LocalEntry};
use super::remote::RemoteCache;
use super::ttl::TtlPair;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Private tier in front of a shared tier.
///
/// Writes are last-write-wins on both tiers. Shared tier failures are logged
/// and behave like misses, so reads never fail because of the cache.
pub struct CacheStore {
    local: LocalCache,
    remote: Arc<dyn RemoteCache>,
    default_local_ttl: Duration,
}

impl CacheStore {
    pub fn new(local_capacity: u64, default_local_ttl: Duration, remote: Arc<dyn RemoteCache>) -> Self {
        Self {
            local: build_local_cache(local_capacity),
            remote,
            default_local_ttl,
        }
    }

    /// Look a key up, repopulating the private tier on a shared hit
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        self.lookup(&key.to_string(), self.default_local_ttl).await
    }

    /// Store a value on both tiers and hand it back
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: T, ttl: TtlPair) -> T {
        self.store(&key.to_string(), &value, ttl).await;
        value
    }

    /// Cached value if present, otherwise run the producer and store its result.
    /// Producer errors are returned as-is and nothing is cached.
    pub async fn get_or_set<T, E, F, Fut>(&self, key: &CacheKey, ttl: TtlPair, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.to_string();
        if let Some(cached) = self.lookup(&key, ttl.local()).await {
            return Ok(cached);
        }

        let value = producer().await?;
        self.store(&key, &value, ttl).await;
        Ok(value)
    }

    /// Like `set`, but returns the rendered key so callers can batch invalidations
    pub async fn write_through<T: Serialize>(&self, key: CacheKey, value: &T, ttl: TtlPair) -> String {
        let key = key.to_string();
        self.store(&key, value, ttl).await;
        key
    }

    /// Evict private-tier entries only
    pub async fn delete_local(&self, keys: &[String]) {
        for key in keys {
            self.local.invalidate(key).await;
        }
        debug!("Evicted {} local cache entries", keys.len());
    }

    /// Drop the whole private tier
    pub fn clear_local(&self) {
        self.local.invalidate_all();
        warn!("Cleared local cache tier");
    }

    /// Evict a key from both tiers
    pub async fn delete(&self, key: &CacheKey) {
        let key = key.to_string();
        self.local.invalidate(&key).await;
        if let Err(e) = self.remote.delete(&key).await {
            warn!("Failed to delete shared cache entry {}: {}", key, e);
        }
    }

    pub fn is_cached_locally(&self, key: &str) -> bool {
        self.local.contains_key(key)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str, local_ttl: Duration) -> Option<T> {
        if let Some(entry) = self.local.get(key).await {
            match serde_json::from_str(&entry.payload) {
                Ok(value) => {
                    debug!("Local cache hit for key: {}", key);
                    return Some(value);
                }
                Err(e) => {
                    warn!("Discarding unreadable local entry {}: {}", key, e);
                    self.local.invalidate(key).await;
                }
            }
        }

        let entry = match self.remote.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("Cache miss for key: {}", key);
                return None;
            }
            Err(e) => {
                warn!("Shared cache unavailable for key {}, treating as miss: {}", key, e);
                return None;
            }
        };

        let value = match serde_json::from_str(&entry.payload) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding unreadable shared entry {}: {}", key, e);
                return None;
            }
        };

        debug!("Shared cache hit for key: {}", key);
        let ttl = local_ttl.min(entry.remaining_ttl);
        if !ttl.is_zero() {
            self.local
                .insert(
                    key.to_string(),
                    LocalEntry {
                        payload: entry.payload,
                        ttl,
                    },
                )
                .await;
        }

        Some(value)
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T, ttl: TtlPair) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize value for key {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.remote.set(key, payload.clone(), ttl.remote()).await {
            warn!("Failed to write shared cache entry {}: {}", key, e);
        }

        if !ttl.local().is_zero() {
            self.local
                .insert(
                    key.to_string(),
                    LocalEntry {
                        payload,
                        ttl: ttl.local(),
                    },
                )
                .await;
        }
        debug!("Cached {} with TTL: {:?}", key, ttl);
    }
}
