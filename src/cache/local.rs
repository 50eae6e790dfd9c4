//! Private (per-process) cache tier using Moka

use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// Serialized value plus the private TTL it was stored with
#[derive(Debug, Clone)]
pub struct LocalEntry {
    pub payload: String,
    pub ttl: Duration,
}

/// Expires each entry after its own TTL instead of a cache-wide one
pub struct PerEntryExpiry;

impl Expiry<String, LocalEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &LocalEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &LocalEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub type LocalCache = Cache<String, LocalEntry>;

pub fn build_local_cache(capacity: u64) -> LocalCache {
    Cache::builder()
        .max_capacity(capacity)
        .expire_after(PerEntryExpiry)
        .build()
}
