use super::ViewCache;
use crate::blockchain::client::{LedgerArg, LedgerError, LedgerReader};
use crate::blockchain::models::{decode_biguint, decode_string};
use crate::cache::{CacheStore, CacheTtlInfo};
use bigdecimal::BigDecimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct GovernanceAbi {
    views: ViewCache,
}

impl GovernanceAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "governance"),
        }
    }

    pub async fn fee_token_id(&self, contract: &str) -> Result<String, LedgerError> {
        let key = self.views.key("feeTokenId").arg(contract);
        let read = async { decode_string(&self.views.read_one(contract, "getFeeTokenId", &[]).await?) };
        self.views.cached(key, CacheTtlInfo::CONTRACT_INFO, read).await
    }

    /// Raw total quorum of a proposal; `None` when the proposal does not exist
    pub async fn read_proposal_total_quorum(
        &self,
        contract: &str,
        proposal_id: u64,
    ) -> Result<Option<BigDecimal>, LedgerError> {
        let values = self
            .views
            .ledger()
            .read(contract, "getProposalTotalQuorum", &[LedgerArg::U64(proposal_id)])
            .await?;
        Ok(values.first().map(|value| decode_biguint(value)))
    }
}
