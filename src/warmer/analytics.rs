use super::WarmerJob;
use crate::cache::InvalidatedKeys;
use crate::compute::analytics::AnalyticsCompute;
use crate::compute::router::RouterCompute;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Refreshes the protocol-wide locked values
pub struct AnalyticsWarmer {
    analytics: Arc<AnalyticsCompute>,
    router: Arc<RouterCompute>,
}

impl AnalyticsWarmer {
    pub fn new(analytics: Arc<AnalyticsCompute>, router: Arc<RouterCompute>) -> Self {
        Self { analytics, router }
    }
}

#[async_trait]
impl WarmerJob for AnalyticsWarmer {
    fn name(&self) -> &'static str {
        "analytics"
    }

    async fn warm(&self, keys: &mut InvalidatedKeys) {
        match self.router.compute_total_locked_value_usd(None).await {
            Ok(value) => keys.push(self.analytics.set_total_value_locked_usd(&value).await),
            Err(e) => warn!("{} skipped total value locked: {}", self.name(), e),
        }

        match self.analytics.compute_locked_value_usd_farms().await {
            Ok(value) => keys.push(self.analytics.set_locked_value_usd_farms(&value).await),
            Err(e) => warn!("{} skipped farms locked value: {}", self.name(), e),
        }
    }
}
