//! Cached accessors for contract views and storage
//!
//! Each ABI service pairs an uncached `read_*` method (one ledger query) with
//! a cached getter and a `set_*` writer sharing the same key and TTL. Warmers
//! and the ingestor call `read_*` then `set_*`; everything else calls the
//! getter.

pub mod escrow;
pub mod farm;
pub mod governance;
pub mod pair;
pub mod price_discovery;
pub mod proxy_pair;
pub mod router;
pub mod simple_lock;
pub mod week;

use crate::blockchain::client::{LedgerArg, LedgerError, LedgerReader};
use crate::blockchain::models::first_value;
use crate::cache::{CacheAside, CacheKey, CacheStore, TtlPair};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

pub use escrow::EscrowAbi;
pub use farm::FarmAbi;
pub use governance::GovernanceAbi;
pub use pair::PairAbi;
pub use price_discovery::PriceDiscoveryAbi;
pub use proxy_pair::ProxyPairAbi;
pub use router::RouterAbi;
pub use simple_lock::SimpleLockAbi;
pub use week::WeekTimekeepingAbi;

#[derive(Clone)]
pub struct ViewCache {
    ledger: Arc<dyn LedgerReader>,
    cache: CacheAside,
}

impl ViewCache {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>, namespace: &'static str) -> Self {
        Self {
            ledger,
            cache: CacheAside::new(store, namespace),
        }
    }

    pub fn key(&self, name: &str) -> CacheKey {
        self.cache.key(name)
    }

    pub fn ledger(&self) -> &dyn LedgerReader {
        self.ledger.as_ref()
    }

    /// Run a view that returns exactly one value
    pub async fn read_one(&self, contract: &str, method: &str, args: &[LedgerArg]) -> Result<Vec<u8>, LedgerError> {
        first_value(self.ledger.read(contract, method, args).await?, method)
    }

    pub async fn cached<T, Fut>(&self, key: CacheKey, ttl: TtlPair, fetch: Fut) -> Result<T, LedgerError>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        self.cache.wrap(key, ttl, || fetch).await
    }

    pub async fn set<T: Serialize>(&self, key: CacheKey, value: &T, ttl: TtlPair) -> String {
        self.cache.store().write_through(key, value, ttl).await
    }
}
