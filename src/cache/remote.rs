//! Shared cache tier
//!
//! Every process instance talks to the same shared store. The trait keeps the
//! backend pluggable; `MemoryRemoteCache` is the in-process backend used when
//! all instances live in one process (and by the tests).

use super::CacheError;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::debug;

/// A shared-tier hit with the time it has left to live
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub payload: String,
    pub remaining_ttl: Duration,
}

#[async_trait]
pub trait RemoteCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<RemoteEntry>, CacheError>;

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    payload: String,
    ttl: Duration,
    stored_at: Instant,
}

struct StoredExpiry;

impl Expiry<String, StoredEntry> for StoredExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct MemoryRemoteCache {
    entries: Cache<String, StoredEntry>,
}

impl MemoryRemoteCache {
    pub fn new(capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .expire_after(StoredExpiry)
            .build();

        Self { entries }
    }
}

#[async_trait]
impl RemoteCache for MemoryRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<RemoteEntry>, CacheError> {
        let Some(entry) = self.entries.get(key).await else {
            return Ok(None);
        };

        let remaining_ttl = entry.ttl.saturating_sub(entry.stored_at.elapsed());
        if remaining_ttl.is_zero() {
            return Ok(None);
        }

        Ok(Some(RemoteEntry {
            payload: entry.payload,
            remaining_ttl,
        }))
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(
                key.to_string(),
                StoredEntry {
                    payload,
                    ttl,
                    stored_at: Instant::now(),
                },
            )
            .await;
        debug!("Stored shared entry {} with TTL: {:?}", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
