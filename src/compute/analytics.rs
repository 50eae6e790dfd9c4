use super::farm::FarmRegistry;
use super::router::RouterCompute;
use super::{now_secs, ComputeError};
use crate::cache::{CacheAside, CacheKey, CacheStore, CacheTtlInfo};
use crate::db::{TimeBucket, TimeSeriesStore};
use bigdecimal::{BigDecimal, Zero};
use futures::future::try_join_all;
use std::sync::Arc;

pub const FEE_BURNED_METRIC: &str = "feeBurned";
pub const PENALTY_BURNED_METRIC: &str = "penaltyBurned";

/// Protocol-wide figures under the `analytics` namespace.
///
/// Locked values and burned amounts are computed on a miss; the staking
/// figures have no local source and only ever come from a setter.
pub struct AnalyticsCompute {
    cache: CacheAside,
    router: Arc<RouterCompute>,
    farms: Arc<FarmRegistry>,
    time_series: Arc<dyn TimeSeriesStore>,
}

impl AnalyticsCompute {
    pub fn new(
        store: Arc<CacheStore>,
        router: Arc<RouterCompute>,
        farms: Arc<FarmRegistry>,
        time_series: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "analytics"),
            router,
            farms,
            time_series,
        }
    }

    async fn write(&self, key: CacheKey, value: &BigDecimal) -> String {
        self.cache.store().write_through(key, value, CacheTtlInfo::ANALYTICS).await
    }

    async fn stored(&self, key: CacheKey) -> Result<BigDecimal, ComputeError> {
        let rendered = key.to_string();
        self.cache
            .store()
            .get(&key)
            .await
            .ok_or_else(|| ComputeError::NotFound(rendered))
    }

    pub async fn total_value_locked_usd(&self) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("totalValueLockedUSD");
        self.cache
            .wrap(key, CacheTtlInfo::ANALYTICS, || self.router.total_locked_value_usd())
            .await
    }

    pub async fn set_total_value_locked_usd(&self, value: &BigDecimal) -> String {
        self.write(self.cache.key("totalValueLockedUSD"), value).await
    }

    pub async fn locked_value_usd_farms(&self) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("lockedValueUSDFarms");
        self.cache
            .wrap(key, CacheTtlInfo::ANALYTICS, || self.compute_locked_value_usd_farms())
            .await
    }

    /// Sum of every configured farm's locked value
    pub async fn compute_locked_value_usd_farms(&self) -> Result<BigDecimal, ComputeError> {
        let farms = self.farms.addresses();
        let values = try_join_all(farms.iter().map(|farm| async move {
            let compute = self.farms.for_farm(farm)?;
            compute.locked_value_usd(farm).await
        }))
        .await?;
        Ok(values.into_iter().fold(BigDecimal::zero(), |acc, value| acc + value))
    }

    pub async fn set_locked_value_usd_farms(&self, value: &BigDecimal) -> String {
        self.write(self.cache.key("lockedValueUSDFarms"), value).await
    }

    pub async fn total_value_staked_usd(&self) -> Result<BigDecimal, ComputeError> {
        self.stored(self.cache.key("totalValueStakedUSD")).await
    }

    pub async fn set_total_value_staked_usd(&self, value: &BigDecimal) -> String {
        self.write(self.cache.key("totalValueStakedUSD"), value).await
    }

    pub async fn total_aggregated_rewards(&self, days: u32) -> Result<BigDecimal, ComputeError> {
        self.stored(self.cache.key("totalAggregatedRewards").arg(days)).await
    }

    pub async fn set_total_aggregated_rewards(&self, days: u32, value: &BigDecimal) -> String {
        self.write(self.cache.key("totalAggregatedRewards").arg(days), value)
            .await
    }

    pub async fn total_locked_mex_staked_usd(&self) -> Result<BigDecimal, ComputeError> {
        self.stored(self.cache.key("totalLockedMexStakedUSD")).await
    }

    pub async fn set_total_locked_mex_staked_usd(&self, value: &BigDecimal) -> String {
        self.write(self.cache.key("totalLockedMexStakedUSD"), value).await
    }

    pub async fn fee_token_burned(&self, token_id: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        self.burned("feeTokenBurned", FEE_BURNED_METRIC, token_id, hours).await
    }

    pub async fn set_fee_token_burned(&self, token_id: &str, hours: i64, value: &BigDecimal) -> String {
        let key = self.cache.key("feeTokenBurned").arg(token_id).arg(format!("{}h", hours));
        self.write(key, value).await
    }

    pub async fn penalty_token_burned(&self, token_id: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        self.burned("penaltyTokenBurned", PENALTY_BURNED_METRIC, token_id, hours)
            .await
    }

    pub async fn set_penalty_token_burned(&self, token_id: &str, hours: i64, value: &BigDecimal) -> String {
        let key = self
            .cache
            .key("penaltyTokenBurned")
            .arg(token_id)
            .arg(format!("{}h", hours));
        self.write(key, value).await
    }

    async fn burned(&self, method: &str, metric: &str, token_id: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key(method).arg(token_id).arg(format!("{}h", hours));
        self.cache
            .wrap(key, CacheTtlInfo::ANALYTICS, || {
                self.compute_burned(token_id, metric, hours)
            })
            .await
    }

    /// Burned amount of `token_id` summed over the last `hours`
    pub async fn compute_burned(&self, token_id: &str, metric: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        let start = now_secs() - hours * TimeBucket::Hour.seconds();
        let points = self
            .time_series
            .query_aggregate(token_id, metric, TimeBucket::Hour, start)
            .await?;
        Ok(points
            .into_iter()
            .fold(BigDecimal::zero(), |acc, point| acc + point.value))
    }
}
