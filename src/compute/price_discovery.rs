use super::amm::{pow10, quote};
use super::token::TokenService;
use super::ComputeError;
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo};
use crate::contracts::PriceDiscoveryAbi;
use crate::db::{TimeBucket, TimeSeriesStore};
use crate::models::{HistoricPoint, PriceDiscoveryPhase};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const LAUNCHED_PRICE_METRIC: &str = "launchedTokenPrice";
pub const ACCEPTED_PRICE_METRIC: &str = "acceptedTokenPrice";
pub const LAUNCHED_PRICE_USD_METRIC: &str = "launchedTokenPriceUSD";
pub const ACCEPTED_PRICE_USD_METRIC: &str = "acceptedTokenPriceUSD";

/// Prices derived from the contract balances at one moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDiscoveryPrices {
    pub launched_token_price: BigDecimal,
    pub accepted_token_price: BigDecimal,
    pub launched_token_price_usd: BigDecimal,
    pub accepted_token_price_usd: BigDecimal,
}

impl PriceDiscoveryPrices {
    /// `(metric, value)` pairs in the order they are recorded
    pub fn metrics(&self) -> [(&'static str, &BigDecimal); 4] {
        [
            (LAUNCHED_PRICE_METRIC, &self.launched_token_price),
            (ACCEPTED_PRICE_METRIC, &self.accepted_token_price),
            (LAUNCHED_PRICE_USD_METRIC, &self.launched_token_price_usd),
            (ACCEPTED_PRICE_USD_METRIC, &self.accepted_token_price_usd),
        ]
    }
}

/// Launch prices of a price discovery contract, cached under `priceDiscovery`.
///
/// Once the contract reaches the redeem phase its balances no longer reflect
/// a market, so prices come from the last recorded value instead.
pub struct PriceDiscoveryCompute {
    cache: CacheAside,
    abi: PriceDiscoveryAbi,
    tokens: Arc<TokenService>,
    time_series: Arc<dyn TimeSeriesStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Launched,
    Accepted,
}

impl PriceDiscoveryCompute {
    pub fn new(
        store: Arc<CacheStore>,
        abi: PriceDiscoveryAbi,
        tokens: Arc<TokenService>,
        time_series: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "priceDiscovery"),
            abi,
            tokens,
            time_series,
        }
    }

    async fn latest_or_zero(&self, contract: &str, metric: &str) -> Result<BigDecimal, ComputeError> {
        Ok(self
            .time_series
            .query_latest(contract, metric)
            .await?
            .unwrap_or_else(BigDecimal::zero))
    }

    pub async fn in_redeem(&self, contract: &str) -> Result<bool, ComputeError> {
        Ok(self.abi.current_phase(contract).await? == PriceDiscoveryPhase::Redeem)
    }

    /// One whole unit of one side quoted in the other side's token
    async fn compute_price(&self, contract: &str, side: Side) -> Result<BigDecimal, ComputeError> {
        let (launched_id, accepted_id, launched_amount, accepted_amount) = tokio::try_join!(
            self.abi.launched_token_id(contract),
            self.abi.accepted_token_id(contract),
            self.abi.launched_token_amount(contract),
            self.abi.accepted_token_amount(contract)
        )?;
        let (launched, accepted) = tokio::try_join!(self.tokens.token(&launched_id), self.tokens.token(&accepted_id))?;

        let price = match side {
            Side::Launched => {
                quote(&pow10(i64::from(launched.decimals)), &launched_amount, &accepted_amount)?
                    * pow10(-i64::from(accepted.decimals))
            }
            Side::Accepted => {
                quote(&pow10(i64::from(accepted.decimals)), &accepted_amount, &launched_amount)?
                    * pow10(-i64::from(launched.decimals))
            }
        };
        Ok(price)
    }

    /// All four prices from the current balances, ignoring the phase
    pub async fn compute_live_prices(&self, contract: &str) -> Result<PriceDiscoveryPrices, ComputeError> {
        let accepted_id = self.abi.accepted_token_id(contract).await?;
        let (launched_token_price, accepted_token_price, accepted_token_price_usd) = tokio::try_join!(
            self.compute_price(contract, Side::Launched),
            self.compute_price(contract, Side::Accepted),
            self.tokens.token_price_usd(&accepted_id)
        )?;
        Ok(PriceDiscoveryPrices {
            launched_token_price_usd: &launched_token_price * &accepted_token_price_usd,
            launched_token_price,
            accepted_token_price,
            accepted_token_price_usd,
        })
    }

    async fn price(&self, contract: &str, metric: &'static str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key(metric).arg(contract);
        self.cache
            .wrap(key, CacheTtlInfo::PRICE, || async {
                if self.in_redeem(contract).await? {
                    return self.latest_or_zero(contract, metric).await;
                }
                let prices = self.compute_live_prices(contract).await?;
                let value = prices
                    .metrics()
                    .into_iter()
                    .find(|(name, _)| *name == metric)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(BigDecimal::zero);
                Ok(value)
            })
            .await
    }

    pub async fn launched_token_price(&self, contract: &str) -> Result<BigDecimal, ComputeError> {
        self.price(contract, LAUNCHED_PRICE_METRIC).await
    }

    pub async fn accepted_token_price(&self, contract: &str) -> Result<BigDecimal, ComputeError> {
        self.price(contract, ACCEPTED_PRICE_METRIC).await
    }

    pub async fn launched_token_price_usd(&self, contract: &str) -> Result<BigDecimal, ComputeError> {
        self.price(contract, LAUNCHED_PRICE_USD_METRIC).await
    }

    pub async fn accepted_token_price_usd(&self, contract: &str) -> Result<BigDecimal, ComputeError> {
        self.price(contract, ACCEPTED_PRICE_USD_METRIC).await
    }

    /// Write all four prices through the cache, returning the written keys
    pub async fn set_prices(&self, contract: &str, prices: &PriceDiscoveryPrices) -> Vec<String> {
        let mut keys = Vec::with_capacity(4);
        for (metric, value) in prices.metrics() {
            let key = self.cache.key(metric).arg(contract);
            keys.push(self.cache.store().write_through(key, value, CacheTtlInfo::PRICE).await);
        }
        keys
    }

    /// Last recorded value of `metric` per time bucket
    pub async fn closing_values(
        &self,
        contract: &str,
        metric: &str,
        bucket: TimeBucket,
    ) -> Result<Vec<HistoricPoint>, ComputeError> {
        let key = self
            .cache
            .key("closingValues")
            .arg(contract)
            .arg(metric)
            .arg(bucket.seconds());
        self.cache
            .wrap(key, CacheTtlInfo::ANALYTICS, || async {
                Ok::<_, ComputeError>(self.time_series.query_closing(contract, metric, bucket, 0).await?)
            })
            .await
    }
}
