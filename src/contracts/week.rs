use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::decode_u64;
use crate::cache::{CacheStore, CacheTtlInfo};
use std::sync::Arc;

/// Week bookkeeping views shared by every contract that tracks weekly rewards
#[derive(Clone)]
pub struct WeekTimekeepingAbi {
    views: ViewCache,
}

impl WeekTimekeepingAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "weekTimekeeping"),
        }
    }

    pub async fn first_week_start_epoch(&self, contract: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("firstWeekStartEpoch").arg(contract);
        self.views
            .cached(key, CacheTtlInfo::CONTRACT_INFO, self.read_first_week_start_epoch(contract))
            .await
    }

    pub async fn read_first_week_start_epoch(&self, contract: &str) -> Result<u64, LedgerError> {
        decode_u64(&self.views.read_one(contract, "getFirstWeekStartEpoch", &[]).await?)
    }
}
