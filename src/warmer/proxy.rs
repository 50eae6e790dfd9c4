use super::WarmerJob;
use crate::blockchain::client::LedgerError;
use crate::cache::InvalidatedKeys;
use crate::contracts::ProxyPairAbi;
use async_trait::async_trait;
use tracing::warn;

/// Refreshes the wrapped LP collection and the pair list of one proxy
pub struct ProxyWarmer {
    proxy: String,
    abi: ProxyPairAbi,
}

impl ProxyWarmer {
    pub fn new(proxy: &str, abi: ProxyPairAbi) -> Self {
        Self {
            proxy: proxy.to_string(),
            abi,
        }
    }

    async fn warm_proxy(&self) -> Result<Vec<String>, LedgerError> {
        let (wrapped_lp_token_id, pairs) = tokio::try_join!(
            self.abi.read_wrapped_lp_token_id(&self.proxy),
            self.abi.read_intermediated_pairs(&self.proxy)
        )?;
        Ok(vec![
            self.abi.set_wrapped_lp_token_id(&self.proxy, &wrapped_lp_token_id).await,
            self.abi.set_intermediated_pairs(&self.proxy, &pairs).await,
        ])
    }
}

#[async_trait]
impl WarmerJob for ProxyWarmer {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn warm(&self, keys: &mut InvalidatedKeys) {
        match self.warm_proxy().await {
            Ok(written) => keys.extend(written),
            Err(e) => warn!("{} skipped proxy {}: {}", self.name(), self.proxy, e),
        }
    }
}
