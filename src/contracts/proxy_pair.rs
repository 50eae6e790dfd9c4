use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::{decode_address, decode_string};
use crate::cache::{CacheStore, CacheTtlInfo, TtlPair};
use std::sync::Arc;
use std::time::Duration;

const PAIRS_TTL: TtlPair = TtlPair::remote_only(Duration::from_secs(3600));

/// Views of the proxy that wraps pair positions in locked tokens
#[derive(Clone)]
pub struct ProxyPairAbi {
    views: ViewCache,
}

impl ProxyPairAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "proxyPair"),
        }
    }

    pub async fn wrapped_lp_token_id(&self, proxy: &str) -> Result<String, LedgerError> {
        let key = self.views.key("wrappedLpTokenID").arg(proxy);
        self.views
            .cached(key, CacheTtlInfo::TOKEN, self.read_wrapped_lp_token_id(proxy))
            .await
    }

    pub async fn read_wrapped_lp_token_id(&self, proxy: &str) -> Result<String, LedgerError> {
        decode_string(&self.views.read_one(proxy, "getWrappedLpTokenId", &[]).await?)
    }

    pub async fn set_wrapped_lp_token_id(&self, proxy: &str, token_id: &str) -> String {
        let key = self.views.key("wrappedLpTokenID").arg(proxy);
        self.views.set(key, &token_id, CacheTtlInfo::TOKEN).await
    }

    /// Pairs whose LP positions the proxy can wrap
    pub async fn intermediated_pairs(&self, proxy: &str) -> Result<Vec<String>, LedgerError> {
        let key = self.views.key("intermediatedPairs").arg(proxy);
        self.views
            .cached(key, PAIRS_TTL, self.read_intermediated_pairs(proxy))
            .await
    }

    pub async fn read_intermediated_pairs(&self, proxy: &str) -> Result<Vec<String>, LedgerError> {
        self.views
            .ledger()
            .read(proxy, "getIntermediatedPairs", &[])
            .await?
            .iter()
            .map(|value| decode_address(value))
            .collect()
    }

    pub async fn set_intermediated_pairs(&self, proxy: &str, pairs: &[String]) -> String {
        let key = self.views.key("intermediatedPairs").arg(proxy);
        self.views.set(key, &pairs, PAIRS_TTL).await
    }
}
