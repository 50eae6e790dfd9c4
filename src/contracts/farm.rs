use super::ViewCache;
use crate::blockchain::client::{LedgerError, LedgerReader};
use crate::blockchain::models::{decode_biguint, decode_bool, decode_string, decode_u64};
use crate::cache::{CacheStore, CacheTtlInfo, TtlPair};
use crate::models::FarmState;
use bigdecimal::BigDecimal;
use serde::Serialize;
use std::sync::Arc;

const TOKENS_TTL: TtlPair = CacheTtlInfo::TOKEN;
const INFO_TTL: TtlPair = CacheTtlInfo::CONTRACT_STATE;
const RESERVES_TTL: TtlPair = CacheTtlInfo::CONTRACT_BALANCE;

/// Farm contract views common to every farm version, plus the v1.2 extras
#[derive(Clone)]
pub struct FarmAbi {
    views: ViewCache,
}

impl FarmAbi {
    pub fn new(ledger: Arc<dyn LedgerReader>, store: Arc<CacheStore>) -> Self {
        Self {
            views: ViewCache::new(ledger, store, "farm"),
        }
    }

    async fn raw(&self, farm: &str, method: &str) -> Result<Vec<u8>, LedgerError> {
        self.views.read_one(farm, method, &[]).await
    }

    async fn set<T: Serialize>(&self, name: &str, farm: &str, value: &T, ttl: TtlPair) -> String {
        self.views.set(self.views.key(name).arg(farm), value, ttl).await
    }

    // Token identifiers

    pub async fn farm_token_id(&self, farm: &str) -> Result<String, LedgerError> {
        let key = self.views.key("farmTokenID").arg(farm);
        self.views.cached(key, TOKENS_TTL, self.read_farm_token_id(farm)).await
    }

    pub async fn read_farm_token_id(&self, farm: &str) -> Result<String, LedgerError> {
        decode_string(&self.raw(farm, "getFarmTokenId").await?)
    }

    pub async fn set_farm_token_id(&self, farm: &str, token_id: &str) -> String {
        self.set("farmTokenID", farm, &token_id, TOKENS_TTL).await
    }

    pub async fn farming_token_id(&self, farm: &str) -> Result<String, LedgerError> {
        let key = self.views.key("farmingTokenID").arg(farm);
        self.views.cached(key, TOKENS_TTL, self.read_farming_token_id(farm)).await
    }

    pub async fn read_farming_token_id(&self, farm: &str) -> Result<String, LedgerError> {
        decode_string(&self.raw(farm, "getFarmingTokenId").await?)
    }

    pub async fn set_farming_token_id(&self, farm: &str, token_id: &str) -> String {
        self.set("farmingTokenID", farm, &token_id, TOKENS_TTL).await
    }

    pub async fn farmed_token_id(&self, farm: &str) -> Result<String, LedgerError> {
        let key = self.views.key("farmedTokenID").arg(farm);
        self.views.cached(key, TOKENS_TTL, self.read_farmed_token_id(farm)).await
    }

    pub async fn read_farmed_token_id(&self, farm: &str) -> Result<String, LedgerError> {
        decode_string(&self.raw(farm, "getRewardTokenId").await?)
    }

    pub async fn set_farmed_token_id(&self, farm: &str, token_id: &str) -> String {
        self.set("farmedTokenID", farm, &token_id, TOKENS_TTL).await
    }

    // Contract settings

    pub async fn minimum_farming_epochs(&self, farm: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("minimumFarmingEpochs").arg(farm);
        self.views.cached(key, INFO_TTL, self.read_minimum_farming_epochs(farm)).await
    }

    pub async fn read_minimum_farming_epochs(&self, farm: &str) -> Result<u64, LedgerError> {
        decode_u64(&self.raw(farm, "getMinimumFarmingEpoch").await?)
    }

    pub async fn set_minimum_farming_epochs(&self, farm: &str, epochs: u64) -> String {
        self.set("minimumFarmingEpochs", farm, &epochs, INFO_TTL).await
    }

    pub async fn penalty_percent(&self, farm: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("penaltyPercent").arg(farm);
        self.views.cached(key, INFO_TTL, self.read_penalty_percent(farm)).await
    }

    pub async fn read_penalty_percent(&self, farm: &str) -> Result<u64, LedgerError> {
        decode_u64(&self.raw(farm, "getPenaltyPercent").await?)
    }

    pub async fn set_penalty_percent(&self, farm: &str, percent: u64) -> String {
        self.set("penaltyPercent", farm, &percent, INFO_TTL).await
    }

    pub async fn rewards_per_block(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("rewardsPerBlock").arg(farm);
        self.views.cached(key, INFO_TTL, self.read_rewards_per_block(farm)).await
    }

    pub async fn read_rewards_per_block(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        Ok(decode_biguint(&self.raw(farm, "getPerBlockRewardAmount").await?))
    }

    pub async fn set_rewards_per_block(&self, farm: &str, amount: &BigDecimal) -> String {
        self.set("rewardsPerBlock", farm, amount, INFO_TTL).await
    }

    pub async fn state(&self, farm: &str) -> Result<FarmState, LedgerError> {
        let key = self.views.key("state").arg(farm);
        self.views.cached(key, INFO_TTL, self.read_state(farm)).await
    }

    pub async fn read_state(&self, farm: &str) -> Result<FarmState, LedgerError> {
        let raw = decode_u64(&self.raw(farm, "getState").await?)?;
        FarmState::from_discriminant(raw).ok_or_else(|| LedgerError::Decode(format!("unknown farm state {}", raw)))
    }

    pub async fn set_state(&self, farm: &str, state: FarmState) -> String {
        self.set("state", farm, &state, INFO_TTL).await
    }

    pub async fn produce_rewards_enabled(&self, farm: &str) -> Result<bool, LedgerError> {
        let key = self.views.key("produceRewardsEnabled").arg(farm);
        self.views
            .cached(key, INFO_TTL, self.read_produce_rewards_enabled(farm))
            .await
    }

    pub async fn read_produce_rewards_enabled(&self, farm: &str) -> Result<bool, LedgerError> {
        decode_bool(&self.raw(farm, "getProduceRewardsEnabled").await?)
    }

    pub async fn set_produce_rewards_enabled(&self, farm: &str, enabled: bool) -> String {
        self.set("produceRewardsEnabled", farm, &enabled, INFO_TTL).await
    }

    // Reserves and reward accounting

    pub async fn farm_token_supply(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("farmTokenSupply").arg(farm);
        self.views.cached(key, RESERVES_TTL, self.read_farm_token_supply(farm)).await
    }

    pub async fn read_farm_token_supply(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        Ok(decode_biguint(&self.raw(farm, "getFarmTokenSupply").await?))
    }

    pub async fn set_farm_token_supply(&self, farm: &str, supply: &BigDecimal) -> String {
        self.set("farmTokenSupply", farm, supply, RESERVES_TTL).await
    }

    pub async fn last_reward_block_nonce(&self, farm: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("lastRewardBlockNonce").arg(farm);
        self.views
            .cached(key, RESERVES_TTL, self.read_last_reward_block_nonce(farm))
            .await
    }

    pub async fn read_last_reward_block_nonce(&self, farm: &str) -> Result<u64, LedgerError> {
        decode_u64(&self.raw(farm, "getLastRewardBlockNonce").await?)
    }

    pub async fn set_last_reward_block_nonce(&self, farm: &str, nonce: u64) -> String {
        self.set("lastRewardBlockNonce", farm, &nonce, RESERVES_TTL).await
    }

    pub async fn reward_per_share(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("rewardPerShare").arg(farm);
        self.views.cached(key, RESERVES_TTL, self.read_reward_per_share(farm)).await
    }

    pub async fn read_reward_per_share(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        Ok(decode_biguint(&self.raw(farm, "getRewardPerShare").await?))
    }

    pub async fn set_reward_per_share(&self, farm: &str, value: &BigDecimal) -> String {
        self.set("rewardPerShare", farm, value, RESERVES_TTL).await
    }

    pub async fn reward_reserve(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("rewardReserve").arg(farm);
        self.views.cached(key, RESERVES_TTL, self.read_reward_reserve(farm)).await
    }

    pub async fn read_reward_reserve(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        Ok(decode_biguint(&self.raw(farm, "getRewardReserve").await?))
    }

    pub async fn set_reward_reserve(&self, farm: &str, value: &BigDecimal) -> String {
        self.set("rewardReserve", farm, value, RESERVES_TTL).await
    }

    // v1.2 only

    pub async fn locked_reward_apr_multiplier(&self, farm: &str) -> Result<u64, LedgerError> {
        let key = self.views.key("aprMultiplier").arg(farm);
        self.views
            .cached(key, INFO_TTL, self.read_locked_reward_apr_multiplier(farm))
            .await
    }

    pub async fn read_locked_reward_apr_multiplier(&self, farm: &str) -> Result<u64, LedgerError> {
        decode_u64(&self.raw(farm, "getLockedRewardAprMuliplier").await?)
    }

    pub async fn set_locked_reward_apr_multiplier(&self, farm: &str, multiplier: u64) -> String {
        self.set("aprMultiplier", farm, &multiplier, INFO_TTL).await
    }

    pub async fn farming_token_reserve(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        let key = self.views.key("farmingTokenReserve").arg(farm);
        self.views
            .cached(key, RESERVES_TTL, self.read_farming_token_reserve(farm))
            .await
    }

    pub async fn read_farming_token_reserve(&self, farm: &str) -> Result<BigDecimal, LedgerError> {
        Ok(decode_biguint(&self.raw(farm, "getFarmingTokenReserve").await?))
    }

    pub async fn set_farming_token_reserve(&self, farm: &str, reserve: &BigDecimal) -> String {
        self.set("farmingTokenReserve", farm, reserve, RESERVES_TTL).await
    }
}
