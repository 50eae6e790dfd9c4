use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::decode_address;
use crate::cache::{CacheStore, CacheTtlInfo};
use std::sync::Arc;

#[derive(Clone)]
pub struct RouterAbi {
    views: ViewCache,
    address: String,
}

impl RouterAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>, address: &str) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "router"),
            address: address.to_string(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Every pair the router manages
    pub async fn pair_addresses(&self) -> Result<Vec<String>, LedgerError> {
        let key = self.views.key("pairsAddress");
        self.views
            .cached(key, CacheTtlInfo::CONTRACT_INFO, self.read_pair_addresses())
            .await
    }

    pub async fn read_pair_addresses(&self) -> Result<Vec<String>, LedgerError> {
        self.views
            .ledger()
            .read(&self.address, "getAllPairsManagedAddresses", &[])
            .await?
            .iter()
            .map(|value| decode_address(value))
            .collect()
    }

    pub async fn set_pair_addresses(&self, addresses: &[String]) -> String {
        let key = self.views.key("pairsAddress");
        self.views.set(key, &addresses, CacheTtlInfo::CONTRACT_INFO).await
    }
}
