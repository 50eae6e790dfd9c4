pub mod aside;
pub mod invalidation;
pub mod keys;
pub mod local;
pub mod remote;
pub mod shared;
pub mod store;
pub mod ttl;

use crate::config::{CacheBackend, Config};
use std::sync::Arc;
use thiserror::Error;

pub use aside::CacheAside;
pub use invalidation::{BroadcastBus, InvalidatedKeys, InvalidationBus, DELETE_CACHE_KEYS};
pub use keys::CacheKey;
pub use remote::{MemoryRemoteCache, RemoteCache, RemoteEntry};
pub use shared::{RedisBus, RedisRemoteCache};
pub use store::CacheStore;
pub use ttl::{CacheTtlInfo, TtlPair};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub fn init_cache(config: &Config, remote: Arc<dyn RemoteCache>) -> Arc<CacheStore> {
    Arc::new(CacheStore::new(
        config.local_cache_capacity,
        config.default_local_ttl,
        remote,
    ))
}

/// Shared tier and invalidation bus for the configured backend
pub async fn connect_shared(
    config: &Config,
) -> Result<(Arc<dyn RemoteCache>, Arc<dyn InvalidationBus>), CacheError> {
    match &config.cache_backend {
        CacheBackend::Memory => Ok((
            Arc::new(MemoryRemoteCache::new(config.shared_cache_capacity)),
            Arc::new(BroadcastBus::default()),
        )),
        CacheBackend::Redis(url) => Ok((
            Arc::new(RedisRemoteCache::connect(url).await?),
            Arc::new(RedisBus::connect(url).await?),
        )),
    }
}
