use super::amm::checked_div;
use super::pair::PairCompute;
use super::router::RouterCompute;
use super::token::TokenService;
use super::usd::{compute_value_usd, normalize_usd};
use super::ComputeError;
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo, TtlPair};
use crate::contracts::FarmAbi;
use crate::models::FarmVersion;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Six-second blocks
pub const BLOCKS_PER_YEAR: u64 = 5_256_000;

pub const UNLOCKED_REWARDS_APR: &str = "unlockedRewardsAPR";
pub const LOCKED_REWARDS_APR: &str = "lockedRewardsAPR";
pub const FARM_APR: &str = "farmAPR";

const PRICE_TTL: TtlPair = CacheTtlInfo::PRICE;
const APR_TTL: TtlPair = CacheTtlInfo::ANALYTICS;

/// Token prices shared by every farm version, normalized to the reference
/// stable coin like the pair figures they are compared with
pub struct FarmPricing {
    cache: CacheAside,
    abi: FarmAbi,
    tokens: Arc<TokenService>,
    router: Arc<RouterCompute>,
    pairs: Arc<PairCompute>,
}

impl FarmPricing {
    pub fn new(
        store: Arc<CacheStore>,
        abi: FarmAbi,
        tokens: Arc<TokenService>,
        router: Arc<RouterCompute>,
        pairs: Arc<PairCompute>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "farm"),
            abi,
            tokens,
            router,
            pairs,
        }
    }

    pub fn abi(&self) -> &FarmAbi {
        &self.abi
    }

    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn farmed_token_price_usd(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("farmedTokenPriceUSD").arg(farm);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_farmed_token_price_usd(farm))
            .await
    }

    pub async fn compute_farmed_token_price_usd(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        let farmed_token_id = self.abi.farmed_token_id(farm).await?;
        let (price, reference) = tokio::try_join!(
            self.tokens.token_price_usd(&farmed_token_id),
            self.tokens.reference_price()
        )?;
        normalize_usd(&price, &reference)
    }

    pub async fn set_farmed_token_price_usd(&self, farm: &str, price: &BigDecimal) -> String {
        let key = self.cache.key("farmedTokenPriceUSD").arg(farm);
        self.cache.store().write_through(key, price, PRICE_TTL).await
    }

    /// Farming tokens are LP tokens, priced through their pair
    pub async fn farming_token_price_usd(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("farmingTokenPriceUSD").arg(farm);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_farming_token_price_usd(farm))
            .await
    }

    pub async fn compute_farming_token_price_usd(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        let farming_token_id = self.abi.farming_token_id(farm).await?;
        let pair = self.router.pair_by_lp_token(&farming_token_id).await?;
        self.pairs.lp_token_price_usd(&pair).await
    }

    pub async fn set_farming_token_price_usd(&self, farm: &str, price: &BigDecimal) -> String {
        let key = self.cache.key("farmingTokenPriceUSD").arg(farm);
        self.cache.store().write_through(key, price, PRICE_TTL).await
    }

    /// Yearly reward value over `locked_value`, 0 while nothing is locked
    pub async fn rewards_apr(&self, farm: &str, locked_value: &BigDecimal) -> Result<BigDecimal, ComputeError> {
        if locked_value.is_zero() {
            return Ok(BigDecimal::zero());
        }

        let farmed_token_id = self.abi.farmed_token_id(farm).await?;
        let (farmed_token, rewards_per_block, farmed_price) = tokio::try_join!(
            self.tokens.token(&farmed_token_id),
            async { Ok::<_, ComputeError>(self.abi.rewards_per_block(farm).await?) },
            self.farmed_token_price_usd(farm)
        )?;

        let yearly_rewards = rewards_per_block * BigDecimal::from(BLOCKS_PER_YEAR);
        let yearly_value = compute_value_usd(&yearly_rewards, farmed_token.decimals, &farmed_price);
        checked_div(&yearly_value, locked_value)
    }
}

/// Version-specific farm metrics. Callers go through the registry and never
/// match on the version themselves.
#[async_trait]
pub trait FarmCompute: Send + Sync {
    fn version(&self) -> FarmVersion;

    fn pricing(&self) -> &FarmPricing;

    /// Raw amount of farming token the contract considers locked
    async fn locked_amount(&self, farm: &str) -> Result<BigDecimal, ComputeError>;

    /// Every APR field this version reports, by name
    async fn compute_apr_metrics(&self, farm: &str) -> Result<Vec<(String, BigDecimal)>, ComputeError>;

    async fn compute_locked_value_usd(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        let pricing = self.pricing();
        let farming_token_id = pricing.abi().farming_token_id(farm).await?;
        let (farming_token, locked, price) = tokio::try_join!(
            pricing.tokens().token(&farming_token_id),
            self.locked_amount(farm),
            pricing.farming_token_price_usd(farm)
        )?;
        Ok(compute_value_usd(&locked, farming_token.decimals, &price))
    }

    async fn locked_value_usd(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        let cache = self.pricing().cache();
        let key = cache.key("totalValueLockedUSD").arg(farm);
        cache
            .wrap(key, PRICE_TTL, || self.compute_locked_value_usd(farm))
            .await
    }

    async fn set_locked_value_usd(&self, farm: &str, value: &BigDecimal) -> String {
        let cache = self.pricing().cache();
        let key = cache.key("totalValueLockedUSD").arg(farm);
        cache.store().write_through(key, value, PRICE_TTL).await
    }

    /// One named APR field, cached
    async fn apr(&self, farm: &str, metric: &str) -> Result<BigDecimal, ComputeError> {
        let cache = self.pricing().cache();
        let key = cache.key(metric).arg(farm);
        cache
            .wrap(key, APR_TTL, || async {
                self.compute_apr_metrics(farm)
                    .await?
                    .into_iter()
                    .find(|(name, _)| name == metric)
                    .map(|(_, value)| value)
                    .ok_or_else(|| {
                        ComputeError::NotFound(format!("{} does not report {} for {}", self.version(), metric, farm))
                    })
            })
            .await
    }

    async fn set_apr(&self, farm: &str, metric: &str, value: &BigDecimal) -> String {
        let cache = self.pricing().cache();
        let key = cache.key(metric).arg(farm);
        cache.store().write_through(key, value, APR_TTL).await
    }
}

/// v1.2 farms track the farming token reserve and pay part of their rewards
/// locked, at a multiplied APR
pub struct FarmV12 {
    pricing: Arc<FarmPricing>,
}

impl FarmV12 {
    pub fn new(pricing: Arc<FarmPricing>) -> Self {
        Self { pricing }
    }
}

#[async_trait]
impl FarmCompute for FarmV12 {
    fn version(&self) -> FarmVersion {
        FarmVersion::V1_2
    }

    fn pricing(&self) -> &FarmPricing {
        &self.pricing
    }

    async fn locked_amount(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        Ok(self.pricing.abi().farming_token_reserve(farm).await?)
    }

    async fn compute_apr_metrics(&self, farm: &str) -> Result<Vec<(String, BigDecimal)>, ComputeError> {
        let (locked_value, multiplier) = tokio::try_join!(self.compute_locked_value_usd(farm), async {
            Ok::<_, ComputeError>(self.pricing.abi().locked_reward_apr_multiplier(farm).await?)
        })?;
        let unlocked = self.pricing.rewards_apr(farm, &locked_value).await?;
        let locked = &unlocked * BigDecimal::from(multiplier);
        debug!("Computed v1.2 APR for farm {}", farm);

        Ok(vec![
            (UNLOCKED_REWARDS_APR.to_string(), unlocked),
            (LOCKED_REWARDS_APR.to_string(), locked),
        ])
    }
}

/// v1.3 farms count the whole farm token supply as locked
pub struct FarmV13 {
    pricing: Arc<FarmPricing>,
}

impl FarmV13 {
    pub fn new(pricing: Arc<FarmPricing>) -> Self {
        Self { pricing }
    }
}

#[async_trait]
impl FarmCompute for FarmV13 {
    fn version(&self) -> FarmVersion {
        FarmVersion::V1_3
    }

    fn pricing(&self) -> &FarmPricing {
        &self.pricing
    }

    async fn locked_amount(&self, farm: &str) -> Result<BigDecimal, ComputeError> {
        Ok(self.pricing.abi().farm_token_supply(farm).await?)
    }

    async fn compute_apr_metrics(&self, farm: &str) -> Result<Vec<(String, BigDecimal)>, ComputeError> {
        let locked_value = self.compute_locked_value_usd(farm).await?;
        let apr = self.pricing.rewards_apr(farm, &locked_value).await?;
        Ok(vec![(FARM_APR.to_string(), apr)])
    }
}

/// Farm contracts by address, populated from configuration at startup
#[derive(Default)]
pub struct FarmRegistry {
    farms: HashMap<String, Arc<dyn FarmCompute>>,
}

impl FarmRegistry {
    pub fn new(pricing: Arc<FarmPricing>, farms: &[(String, FarmVersion)]) -> Self {
        let v1_2: Arc<dyn FarmCompute> = Arc::new(FarmV12::new(pricing.clone()));
        let v1_3: Arc<dyn FarmCompute> = Arc::new(FarmV13::new(pricing));

        let farms = farms
            .iter()
            .map(|(address, version)| {
                let compute = match version {
                    FarmVersion::V1_2 => v1_2.clone(),
                    FarmVersion::V1_3 => v1_3.clone(),
                };
                (address.clone(), compute)
            })
            .collect();

        Self { farms }
    }

    pub fn for_farm(&self, address: &str) -> Result<Arc<dyn FarmCompute>, ComputeError> {
        self.farms
            .get(address)
            .cloned()
            .ok_or_else(|| ComputeError::NotFound(format!("farm {}", address)))
    }

    pub fn version(&self, address: &str) -> Option<FarmVersion> {
        self.farms.get(address).map(|compute| compute.version())
    }

    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.farms.keys().cloned().collect();
        addresses.sort();
        addresses
    }
}
