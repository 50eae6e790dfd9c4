use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::{decode_biguint, decode_string, decode_u64};
use crate::cache::{CacheStore, CacheTtlInfo, TtlPair};
use crate::models::{PairReserveSnapshot, PairState};
use std::sync::Arc;

const RESERVES_TTL: TtlPair = CacheTtlInfo::CONTRACT_BALANCE;

/// Pair contract views, cached under the `pair` namespace
#[derive(Clone)]
pub struct PairAbi {
    views: ViewCache,
}

impl PairAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "pair"),
        }
    }

    pub async fn first_token_id(&self, pair: &str) -> Result<String, LedgerError> {
        let key = self.views.key("firstTokenID").arg(pair);
        self.views.cached(key, CacheTtlInfo::TOKEN, self.read_first_token_id(pair)).await
    }

    pub async fn read_first_token_id(&self, pair: &str) -> Result<String, LedgerError> {
        decode_string(&self.views.read_one(pair, "getFirstTokenId", &[]).await?)
    }

    pub async fn set_first_token_id(&self, pair: &str, token_id: &str) -> String {
        let key = self.views.key("firstTokenID").arg(pair);
        self.views.set(key, &token_id, CacheTtlInfo::TOKEN).await
    }

    pub async fn second_token_id(&self, pair: &str) -> Result<String, LedgerError> {
        let key = self.views.key("secondTokenID").arg(pair);
        self.views.cached(key, CacheTtlInfo::TOKEN, self.read_second_token_id(pair)).await
    }

    pub async fn read_second_token_id(&self, pair: &str) -> Result<String, LedgerError> {
        decode_string(&self.views.read_one(pair, "getSecondTokenId", &[]).await?)
    }

    pub async fn set_second_token_id(&self, pair: &str, token_id: &str) -> String {
        let key = self.views.key("secondTokenID").arg(pair);
        self.views.set(key, &token_id, CacheTtlInfo::TOKEN).await
    }

    pub async fn lp_token_id(&self, pair: &str) -> Result<String, LedgerError> {
        let key = self.views.key("lpTokenID").arg(pair);
        self.views.cached(key, CacheTtlInfo::TOKEN, self.read_lp_token_id(pair)).await
    }

    pub async fn read_lp_token_id(&self, pair: &str) -> Result<String, LedgerError> {
        decode_string(&self.views.read_one(pair, "getLpTokenIdentifier", &[]).await?)
    }

    pub async fn set_lp_token_id(&self, pair: &str, token_id: &str) -> String {
        let key = self.views.key("lpTokenID").arg(pair);
        self.views.set(key, &token_id, CacheTtlInfo::TOKEN).await
    }

    /// Reserves of both tokens plus the LP token supply
    pub async fn reserves(&self, pair: &str) -> Result<PairReserveSnapshot, LedgerError> {
        let key = self.views.key("reserves").arg(pair);
        self.views.cached(key, RESERVES_TTL, self.read_reserves(pair)).await
    }

    pub async fn read_reserves(&self, pair: &str) -> Result<PairReserveSnapshot, LedgerError> {
        let values = self
            .views
            .ledger()
            .read(pair, "getReservesAndTotalSupply", &[])
            .await?;
        if values.len() != 3 {
            return Err(LedgerError::Decode(format!(
                "getReservesAndTotalSupply returned {} values, expected 3",
                values.len()
            )));
        }

        Ok(PairReserveSnapshot {
            pair_address: pair.to_string(),
            first_token_reserve: decode_biguint(&values[0]),
            second_token_reserve: decode_biguint(&values[1]),
            lp_supply: decode_biguint(&values[2]),
        })
    }

    pub async fn set_reserves(&self, snapshot: &PairReserveSnapshot) -> String {
        let key = self.views.key("reserves").arg(&snapshot.pair_address);
        self.views.set(key, snapshot, RESERVES_TTL).await
    }

    /// Total swap fee in contract units (100 000 = 100%)
    pub async fn total_fee_percent(&self, pair: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("totalFeePercent").arg(pair);
        self.views
            .cached(key, CacheTtlInfo::CONTRACT_STATE, self.read_total_fee_percent(pair))
            .await
    }

    pub async fn read_total_fee_percent(&self, pair: &str) -> Result<u64, LedgerError> {
        decode_u64(&self.views.read_one(pair, "getTotalFeePercent", &[]).await?)
    }

    pub async fn set_total_fee_percent(&self, pair: &str, fee_percent: u64) -> String {
        let key = self.views.key("totalFeePercent").arg(pair);
        self.views.set(key, &fee_percent, CacheTtlInfo::CONTRACT_STATE).await
    }

    pub async fn state(&self, pair: &str) -> Result<PairState, LedgerError> {
        let key = self.views.key("state").arg(pair);
        self.views.cached(key, CacheTtlInfo::CONTRACT_STATE, self.read_state(pair)).await
    }

    pub async fn read_state(&self, pair: &str) -> Result<PairState, LedgerError> {
        let raw = decode_u64(&self.views.read_one(pair, "getState", &[]).await?)?;
        PairState::from_discriminant(raw).ok_or_else(|| LedgerError::Decode(format!("unknown pair state {}", raw)))
    }

    pub async fn set_state(&self, pair: &str, state: PairState) -> String {
        let key = self.views.key("state").arg(pair);
        self.views.set(key, &state, CacheTtlInfo::CONTRACT_STATE).await
    }
}
