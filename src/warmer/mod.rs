//! Periodic refresh of slow-changing cached values.
//!
//! Each job re-reads its values from the ledger, writes them through the
//! cache and collects the written keys; the whole pass is published to the
//! invalidation bus once at the end.

pub mod analytics;
pub mod farm;
pub mod pair;
pub mod price_discovery;
pub mod proxy;

use crate::cache::{InvalidatedKeys, InvalidationBus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use analytics::AnalyticsWarmer;
pub use farm::{FarmJob, FarmWarmer};
pub use pair::{PairJob, PairWarmer};
pub use price_discovery::PriceDiscoveryWarmer;
pub use proxy::ProxyWarmer;

#[async_trait]
pub trait WarmerJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// Refresh everything this job owns, pushing every written key
    async fn warm(&self, keys: &mut InvalidatedKeys);
}

/// One refresh pass followed by a single publish. Returns the number of
/// keys published.
pub async fn run_pass(job: &dyn WarmerJob, bus: &dyn InvalidationBus) -> usize {
    let mut keys = InvalidatedKeys::new();
    job.warm(&mut keys).await;

    match keys.flush(bus).await {
        Ok(count) => {
            debug!("Warmer {} refreshed {} keys", job.name(), count);
            count
        }
        Err(e) => {
            warn!("Warmer {} failed to publish invalidations: {}", job.name(), e);
            0
        }
    }
}

pub fn spawn_warmer(
    job: Arc<dyn WarmerJob>,
    bus: Arc<dyn InvalidationBus>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting warmer {} every {:?}", job.name(), period);
        let mut ticker = interval(period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_pass(job.as_ref(), bus.as_ref()).await;
                }
                _ = shutdown.cancelled() => {
                    info!("Shutting down warmer {}", job.name());
                    break;
                }
            }
        }
    })
}
