use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::decode_string;
use crate::cache::{CacheStore, CacheTtlInfo};
use std::sync::Arc;

/// Token collections issued by a simple-lock contract
#[derive(Clone)]
pub struct SimpleLockAbi {
    views: ViewCache,
}

impl SimpleLockAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "simpleLock"),
        }
    }

    async fn token_id(&self, contract: &str, name: &str, view: &str) -> Result<String, LedgerError> {
        let key = self.views.key(name).arg(contract);
        let read = async { decode_string(&self.views.read_one(contract, view, &[]).await?) };
        self.views.cached(key, CacheTtlInfo::TOKEN, read).await
    }

    pub async fn locked_token_id(&self, contract: &str) -> Result<String, LedgerError> {
        self.token_id(contract, "lockedTokenID", "getLockedTokenId").await
    }

    pub async fn lp_proxy_token_id(&self, contract: &str) -> Result<String, LedgerError> {
        self.token_id(contract, "lpProxyTokenID", "getLpProxyTokenId").await
    }

    pub async fn farm_proxy_token_id(&self, contract: &str) -> Result<String, LedgerError> {
        self.token_id(contract, "farmProxyTokenID", "getFarmProxyTokenId").await
    }
}
