use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::{decode_biguint, decode_string, decode_u64};
use crate::cache::{CacheStore, CacheTtlInfo};
use crate::models::PriceDiscoveryPhase;
use bigdecimal::BigDecimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct PriceDiscoveryAbi {
    views: ViewCache,
}

impl PriceDiscoveryAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "priceDiscovery"),
        }
    }

    pub async fn launched_token_id(&self, contract: &str) -> Result<String, LedgerError> {
        let key = self.views.key("launchedTokenID").arg(contract);
        let read = async { decode_string(&self.views.read_one(contract, "getLaunchedTokenId", &[]).await?) };
        self.views.cached(key, CacheTtlInfo::TOKEN, read).await
    }

    pub async fn accepted_token_id(&self, contract: &str) -> Result<String, LedgerError> {
        let key = self.views.key("acceptedTokenID").arg(contract);
        let read = async { decode_string(&self.views.read_one(contract, "getAcceptedTokenId", &[]).await?) };
        self.views.cached(key, CacheTtlInfo::TOKEN, read).await
    }

    pub async fn launched_token_amount(&self, contract: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("launchedTokenAmount").arg(contract);
        let read = async {
            Ok::<_, LedgerError>(decode_biguint(
                &self.views.read_one(contract, "getLaunchedTokenBalance", &[]).await?,
            ))
        };
        self.views.cached(key, CacheTtlInfo::CONTRACT_BALANCE, read).await
    }

    pub async fn accepted_token_amount(&self, contract: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("acceptedTokenAmount").arg(contract);
        let read = async {
            Ok::<_, LedgerError>(decode_biguint(
                &self.views.read_one(contract, "getAcceptedTokenBalance", &[]).await?,
            ))
        };
        self.views.cached(key, CacheTtlInfo::CONTRACT_BALANCE, read).await
    }

    pub async fn current_phase(&self, contract: &str) -> Result<PriceDiscoveryPhase, LedgerError> {
        let key = self.views.key("currentPhase").arg(contract);
        let read = async {
            let raw = decode_u64(&self.views.read_one(contract, "getCurrentPhase", &[]).await?)?;
            PriceDiscoveryPhase::from_discriminant(raw)
                .ok_or_else(|| LedgerError::Decode(format!("unknown price discovery phase {}", raw)))
        };
        self.views.cached(key, CacheTtlInfo::CONTRACT_STATE, read).await
    }
}
