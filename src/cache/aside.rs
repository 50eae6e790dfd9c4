use super::keys::CacheKey;
use super::store::CacheStore;
use super::ttl::TtlPair;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::error;

/// Cache-aside helper bound to one namespace.
///
/// `wrap` checks the cache and otherwise runs the method body, storing the
/// result. Failures are logged and returned unchanged; they are never cached.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<CacheStore>,
    namespace: &'static str,
}

impl CacheAside {
    pub fn new(store: Arc<CacheStore>, namespace: &'static str) -> Self {
        Self { store, namespace }
    }

    /// Key for one method of this namespace; append the method arguments with `arg`
    pub fn key(&self, method: &str) -> CacheKey {
        CacheKey::new(self.namespace).arg(method)
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub async fn wrap<T, E, F, Fut>(&self, key: CacheKey, ttl: TtlPair, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.store.get_or_set(&key, ttl, producer).await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("{} computation failed for key {}: {}", self.namespace, key, e);
                Err(e)
            }
        }
    }
}
