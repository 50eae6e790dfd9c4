use super::WarmerJob;
use crate::cache::InvalidatedKeys;
use crate::compute::pair::{PairCompute, PairSide, FEES_USD_METRIC, VOLUME_USD_METRIC};
use crate::compute::router::RouterCompute;
use crate::compute::ComputeError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

const DAY_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairJob {
    Info,
    Analytics,
}

pub struct PairWarmer {
    job: PairJob,
    pairs: Arc<PairCompute>,
    router: Arc<RouterCompute>,
}

impl PairWarmer {
    pub fn new(job: PairJob, pairs: Arc<PairCompute>, router: Arc<RouterCompute>) -> Self {
        Self { job, pairs, router }
    }

    async fn warm_info(&self, pair: &str) -> Result<Vec<String>, ComputeError> {
        let abi = self.pairs.pair_abi();
        let (first_token_id, second_token_id, lp_token_id, fee_percent, state) = tokio::try_join!(
            abi.read_first_token_id(pair),
            abi.read_second_token_id(pair),
            abi.read_lp_token_id(pair),
            abi.read_total_fee_percent(pair),
            abi.read_state(pair)
        )?;

        Ok(vec![
            abi.set_first_token_id(pair, &first_token_id).await,
            abi.set_second_token_id(pair, &second_token_id).await,
            abi.set_lp_token_id(pair, &lp_token_id).await,
            abi.set_total_fee_percent(pair, fee_percent).await,
            abi.set_state(pair, state).await,
        ])
    }

    async fn warm_analytics(&self, pair: &str) -> Result<Vec<String>, ComputeError> {
        let (volume, fees, first_volume, second_volume) = tokio::try_join!(
            self.pairs.compute_windowed(pair, VOLUME_USD_METRIC, DAY_HOURS),
            self.pairs.compute_windowed(pair, FEES_USD_METRIC, DAY_HOURS),
            self.pairs.compute_windowed(pair, PairSide::First.volume_metric(), DAY_HOURS),
            self.pairs.compute_windowed(pair, PairSide::Second.volume_metric(), DAY_HOURS)
        )?;
        let volume_key = self.pairs.set_volume_usd(pair, DAY_HOURS, &volume).await;
        let fees_key = self.pairs.set_fees_usd(pair, DAY_HOURS, &fees).await;
        let first_key = self
            .pairs
            .set_token_volume(pair, PairSide::First, DAY_HOURS, &first_volume)
            .await;
        let second_key = self
            .pairs
            .set_token_volume(pair, PairSide::Second, DAY_HOURS, &second_volume)
            .await;

        // Reads the fees just written
        let fees_apr = self.pairs.compute_fees_apr(pair).await?;
        let apr_key = self.pairs.set_fees_apr(pair, &fees_apr).await;

        Ok(vec![volume_key, fees_key, first_key, second_key, apr_key])
    }
}

#[async_trait]
impl WarmerJob for PairWarmer {
    fn name(&self) -> &'static str {
        match self.job {
            PairJob::Info => "pair-info",
            PairJob::Analytics => "pair-analytics",
        }
    }

    async fn warm(&self, keys: &mut InvalidatedKeys) {
        let pairs = match self.job {
            PairJob::Info => match self.router.router_abi().read_pair_addresses().await {
                Ok(pairs) => {
                    keys.push(self.router.router_abi().set_pair_addresses(&pairs).await);
                    pairs
                }
                Err(e) => {
                    warn!("{} could not list pairs: {}", self.name(), e);
                    return;
                }
            },
            PairJob::Analytics => match self.router.pair_addresses().await {
                Ok(pairs) => pairs,
                Err(e) => {
                    warn!("{} could not list pairs: {}", self.name(), e);
                    return;
                }
            },
        };

        for pair in pairs {
            let written = match self.job {
                PairJob::Info => self.warm_info(&pair).await,
                PairJob::Analytics => self.warm_analytics(&pair).await,
            };
            match written {
                Ok(written) => keys.extend(written),
                Err(e) => warn!("{} skipped pair {}: {}", self.name(), pair, e),
            }
        }
    }
}
