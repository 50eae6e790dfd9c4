use super::amm::{pow10, quote};
use super::ComputeError;
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo};
use crate::contracts::{PairAbi, RouterAbi};
use crate::models::Token;
use crate::providers::{PriceOracle, TokenMetadataSource};
use bigdecimal::BigDecimal;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Token metadata and USD prices, cached under the `token` namespace.
///
/// Prices here are in raw oracle units; callers that report USD figures
/// divide by `reference_price`.
pub struct TokenService {
    cache: CacheAside,
    metadata: Arc<dyn TokenMetadataSource>,
    oracle: Arc<dyn PriceOracle>,
    pair_abi: PairAbi,
    router_abi: RouterAbi,
    oracle_symbols: HashMap<String, String>,
    common_tokens: Vec<String>,
    reference_symbol: String,
}

impl TokenService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<CacheStore>,
        metadata: Arc<dyn TokenMetadataSource>,
        oracle: Arc<dyn PriceOracle>,
        pair_abi: PairAbi,
        router_abi: RouterAbi,
        oracle_symbols: HashMap<String, String>,
        common_tokens: Vec<String>,
        reference_symbol: &str,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "token"),
            metadata,
            oracle,
            pair_abi,
            router_abi,
            oracle_symbols,
            common_tokens,
            reference_symbol: reference_symbol.to_string(),
        }
    }

    pub async fn token(&self, identifier: &str) -> Result<Token, ComputeError> {
        let key = self.cache.key("metadata").arg(identifier);
        self.cache
            .wrap(key, CacheTtlInfo::TOKEN, || self.fetch_token(identifier))
            .await
    }

    pub async fn fetch_token(&self, identifier: &str) -> Result<Token, ComputeError> {
        Ok(self.metadata.token(identifier).await?)
    }

    pub async fn set_token(&self, token: &Token) -> String {
        let key = self.cache.key("metadata").arg(&token.identifier);
        self.cache.store().write_through(key, token, CacheTtlInfo::TOKEN).await
    }

    pub async fn oracle_price(&self, symbol: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("oraclePrice").arg(symbol);
        self.cache
            .wrap(key, CacheTtlInfo::PRICE, || async {
                Ok::<_, ComputeError>(self.oracle.get_price(symbol).await?)
            })
            .await
    }

    /// Oracle price of the stable coin every USD figure is expressed in
    pub async fn reference_price(&self) -> Result<BigDecimal, ComputeError> {
        self.oracle_price(&self.reference_symbol).await
    }

    pub async fn token_price_usd(&self, identifier: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("priceUSD").arg(identifier);
        self.cache
            .wrap(key, CacheTtlInfo::PRICE, || self.compute_token_price_usd(identifier))
            .await
    }

    pub async fn set_token_price_usd(&self, identifier: &str, price: &BigDecimal) -> String {
        let key = self.cache.key("priceUSD").arg(identifier);
        self.cache.store().write_through(key, price, CacheTtlInfo::PRICE).await
    }

    /// Oracle price when the token has a feed, otherwise derived through a
    /// pair against a common token that has one
    pub async fn compute_token_price_usd(&self, identifier: &str) -> Result<BigDecimal, ComputeError> {
        if let Some(symbol) = self.oracle_symbols.get(identifier) {
            return self.oracle_price(symbol).await;
        }

        let pairs = self.router_abi.pair_addresses().await?;
        let tokens = try_join_all(pairs.iter().map(|pair| async move {
            let (first, second) = tokio::try_join!(
                self.pair_abi.first_token_id(pair),
                self.pair_abi.second_token_id(pair)
            )?;
            Ok::<_, ComputeError>((pair, first, second))
        }))
        .await?;

        for (pair, first, second) in tokens {
            let (counterpart, token_is_first) = if first == identifier {
                (second, true)
            } else if second == identifier {
                (first, false)
            } else {
                continue;
            };

            if !self.common_tokens.contains(&counterpart) {
                continue;
            }
            let Some(symbol) = self.oracle_symbols.get(&counterpart) else {
                continue;
            };

            let (token, common, reserves, common_price) = tokio::try_join!(
                self.token(identifier),
                self.token(&counterpart),
                async { Ok::<_, ComputeError>(self.pair_abi.reserves(pair).await?) },
                self.oracle_price(symbol)
            )?;

            let (reserve_token, reserve_common) = if token_is_first {
                (&reserves.first_token_reserve, &reserves.second_token_reserve)
            } else {
                (&reserves.second_token_reserve, &reserves.first_token_reserve)
            };

            let one_unit = pow10(i64::from(token.decimals));
            let price_in_common =
                quote(&one_unit, reserve_token, reserve_common)? * pow10(-i64::from(common.decimals));
            debug!("Derived price of {} through pair {}", identifier, pair);
            return Ok(price_in_common * common_price);
        }

        Err(ComputeError::NotFound(format!("no price source for token {}", identifier)))
    }
}
