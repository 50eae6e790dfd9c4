use super::WarmerJob;
use crate::cache::InvalidatedKeys;
use crate::compute::farm::{FarmPricing, FarmRegistry};
use crate::compute::token::TokenService;
use crate::compute::ComputeError;
use crate::models::FarmVersion;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarmJob {
    Tokens,
    Info,
    Reserves,
    Prices,
    Apr,
}

pub struct FarmWarmer {
    job: FarmJob,
    farms: Arc<FarmRegistry>,
    pricing: Arc<FarmPricing>,
    tokens: Arc<TokenService>,
}

impl FarmWarmer {
    pub fn new(job: FarmJob, farms: Arc<FarmRegistry>, pricing: Arc<FarmPricing>, tokens: Arc<TokenService>) -> Self {
        Self {
            job,
            farms,
            pricing,
            tokens,
        }
    }

    async fn warm_farm(&self, farm: &str) -> Result<Vec<String>, ComputeError> {
        match self.job {
            FarmJob::Tokens => self.warm_tokens(farm).await,
            FarmJob::Info => self.warm_info(farm).await,
            FarmJob::Reserves => self.warm_reserves(farm).await,
            FarmJob::Prices => self.warm_prices(farm).await,
            FarmJob::Apr => self.warm_apr(farm).await,
        }
    }

    async fn warm_tokens(&self, farm: &str) -> Result<Vec<String>, ComputeError> {
        let abi = self.pricing.abi();
        let (farm_token_id, farming_token_id, farmed_token_id) = tokio::try_join!(
            abi.read_farm_token_id(farm),
            abi.read_farming_token_id(farm),
            abi.read_farmed_token_id(farm)
        )?;
        let (farm_token, farming_token, farmed_token) = tokio::try_join!(
            self.tokens.fetch_token(&farm_token_id),
            self.tokens.fetch_token(&farming_token_id),
            self.tokens.fetch_token(&farmed_token_id)
        )?;

        Ok(vec![
            abi.set_farm_token_id(farm, &farm_token_id).await,
            abi.set_farming_token_id(farm, &farming_token_id).await,
            abi.set_farmed_token_id(farm, &farmed_token_id).await,
            self.tokens.set_token(&farm_token).await,
            self.tokens.set_token(&farming_token).await,
            self.tokens.set_token(&farmed_token).await,
        ])
    }

    async fn warm_info(&self, farm: &str) -> Result<Vec<String>, ComputeError> {
        let abi = self.pricing.abi();
        let (minimum_epochs, penalty, rewards_per_block, state, produce_rewards) = tokio::try_join!(
            abi.read_minimum_farming_epochs(farm),
            abi.read_penalty_percent(farm),
            abi.read_rewards_per_block(farm),
            abi.read_state(farm),
            abi.read_produce_rewards_enabled(farm)
        )?;

        let mut keys = vec![
            abi.set_minimum_farming_epochs(farm, minimum_epochs).await,
            abi.set_penalty_percent(farm, penalty).await,
            abi.set_rewards_per_block(farm, &rewards_per_block).await,
            abi.set_state(farm, state).await,
            abi.set_produce_rewards_enabled(farm, produce_rewards).await,
        ];

        if self.farms.version(farm) == Some(FarmVersion::V1_2) {
            let multiplier = abi.read_locked_reward_apr_multiplier(farm).await?;
            keys.push(abi.set_locked_reward_apr_multiplier(farm, multiplier).await);
        }
        Ok(keys)
    }

    async fn warm_reserves(&self, farm: &str) -> Result<Vec<String>, ComputeError> {
        let abi = self.pricing.abi();
        let (supply, last_nonce, reward_per_share, reward_reserve) = tokio::try_join!(
            abi.read_farm_token_supply(farm),
            abi.read_last_reward_block_nonce(farm),
            abi.read_reward_per_share(farm),
            abi.read_reward_reserve(farm)
        )?;

        let mut keys = vec![
            abi.set_farm_token_supply(farm, &supply).await,
            abi.set_last_reward_block_nonce(farm, last_nonce).await,
            abi.set_reward_per_share(farm, &reward_per_share).await,
            abi.set_reward_reserve(farm, &reward_reserve).await,
        ];

        if self.farms.version(farm) == Some(FarmVersion::V1_2) {
            let reserve = abi.read_farming_token_reserve(farm).await?;
            keys.push(abi.set_farming_token_reserve(farm, &reserve).await);
        }
        Ok(keys)
    }

    async fn warm_prices(&self, farm: &str) -> Result<Vec<String>, ComputeError> {
        let compute = self.farms.for_farm(farm)?;
        let (farmed_price, farming_price, locked_value) = tokio::try_join!(
            self.pricing.compute_farmed_token_price_usd(farm),
            self.pricing.compute_farming_token_price_usd(farm),
            compute.compute_locked_value_usd(farm)
        )?;

        Ok(vec![
            self.pricing.set_farmed_token_price_usd(farm, &farmed_price).await,
            self.pricing.set_farming_token_price_usd(farm, &farming_price).await,
            compute.set_locked_value_usd(farm, &locked_value).await,
        ])
    }

    async fn warm_apr(&self, farm: &str) -> Result<Vec<String>, ComputeError> {
        let compute = self.farms.for_farm(farm)?;
        let metrics = compute.compute_apr_metrics(farm).await?;

        let mut keys = Vec::with_capacity(metrics.len());
        for (metric, value) in metrics {
            keys.push(compute.set_apr(farm, &metric, &value).await);
        }
        Ok(keys)
    }
}

#[async_trait]
impl WarmerJob for FarmWarmer {
    fn name(&self) -> &'static str {
        match self.job {
            FarmJob::Tokens => "farm-tokens",
            FarmJob::Info => "farm-info",
            FarmJob::Reserves => "farm-reserves",
            FarmJob::Prices => "farm-prices",
            FarmJob::Apr => "farm-apr",
        }
    }

    async fn warm(&self, keys: &mut InvalidatedKeys) {
        for farm in self.farms.addresses() {
            match self.warm_farm(&farm).await {
                Ok(written) => keys.extend(written),
                Err(e) => warn!("{} skipped farm {}: {}", self.name(), farm, e),
            }
        }
    }
}
