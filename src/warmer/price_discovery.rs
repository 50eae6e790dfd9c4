use super::WarmerJob;
use crate::cache::InvalidatedKeys;
use crate::compute::price_discovery::PriceDiscoveryCompute;
use crate::compute::{now_secs, ComputeError};
use crate::db::TimeSeriesStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Refreshes launch prices and appends them to the time series, which is
/// what redeem-phase prices and closing values are read from.
pub struct PriceDiscoveryWarmer {
    contracts: Vec<String>,
    compute: Arc<PriceDiscoveryCompute>,
    time_series: Arc<dyn TimeSeriesStore>,
}

impl PriceDiscoveryWarmer {
    pub fn new(
        contracts: Vec<String>,
        compute: Arc<PriceDiscoveryCompute>,
        time_series: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            contracts,
            compute,
            time_series,
        }
    }

    async fn warm_contract(&self, contract: &str) -> Result<Vec<String>, ComputeError> {
        // Balances stop moving in the redeem phase; keep the last recorded prices
        if self.compute.in_redeem(contract).await? {
            debug!("Price discovery {} is redeeming, nothing to record", contract);
            return Ok(Vec::new());
        }

        let prices = self.compute.compute_live_prices(contract).await?;
        let keys = self.compute.set_prices(contract, &prices).await;

        let timestamp = now_secs();
        for (metric, value) in prices.metrics() {
            self.time_series.record(contract, metric, timestamp, value).await?;
        }
        Ok(keys)
    }
}

#[async_trait]
impl WarmerJob for PriceDiscoveryWarmer {
    fn name(&self) -> &'static str {
        "price-discovery"
    }

    async fn warm(&self, keys: &mut InvalidatedKeys) {
        for contract in &self.contracts {
            match self.warm_contract(contract).await {
                Ok(written) => keys.extend(written),
                Err(e) => warn!("{} skipped contract {}: {}", self.name(), contract, e),
            }
        }
    }
}
