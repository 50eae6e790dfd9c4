use super::pair::PairCompute;
use super::route::{build_multi_pair_swap, check_route_shape};
use super::ComputeError;
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo, TtlPair};
use crate::contracts::{PairAbi, RouterAbi};
use crate::models::{MultiPairSwap, RouteSpec};
use bigdecimal::{BigDecimal, Zero};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

const LOCKED_TTL: TtlPair = CacheTtlInfo::CONTRACT_BALANCE;

/// Protocol-wide aggregates and multi-hop route handling, cached under the
/// `router` namespace
pub struct RouterCompute {
    cache: CacheAside,
    router_abi: RouterAbi,
    pair_abi: PairAbi,
    pairs: Arc<PairCompute>,
}

impl RouterCompute {
    pub fn new(store: Arc<CacheStore>, router_abi: RouterAbi, pair_abi: PairAbi, pairs: Arc<PairCompute>) -> Self {
        Self {
            cache: CacheAside::new(store, "router"),
            router_abi,
            pair_abi,
            pairs,
        }
    }

    pub fn router_abi(&self) -> &RouterAbi {
        &self.router_abi
    }

    pub async fn pair_addresses(&self) -> Result<Vec<String>, ComputeError> {
        Ok(self.router_abi.pair_addresses().await?)
    }

    pub async fn total_locked_value_usd(&self) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("totalLockedValueUSD");
        self.cache
            .wrap(key, CacheTtlInfo::ANALYTICS, || self.compute_total_locked_value_usd(None))
            .await
    }

    /// Sum of every pair's locked value. `fresh` overrides the cached value
    /// of one pair with a just-computed one.
    pub async fn compute_total_locked_value_usd(
        &self,
        fresh: Option<(&str, &BigDecimal)>,
    ) -> Result<BigDecimal, ComputeError> {
        let pairs = self.pair_addresses().await?;
        let values = try_join_all(pairs.iter().map(|pair| async move {
            match fresh {
                Some((address, value)) if address == pair.as_str() => Ok(value.clone()),
                _ => self.pairs.locked_value_usd(pair).await,
            }
        }))
        .await?;

        Ok(values.into_iter().fold(BigDecimal::zero(), |acc, value| acc + value))
    }

    pub async fn set_total_locked_value_usd(&self, value: &BigDecimal) -> String {
        let key = self.cache.key("totalLockedValueUSD");
        self.cache
            .store()
            .write_through(key, value, CacheTtlInfo::ANALYTICS)
            .await
    }

    /// Raw amount of a token held across every pair
    pub async fn token_total_locked_amount(&self, token_id: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("tokenTotalLocked").arg(token_id);
        self.cache
            .wrap(key, LOCKED_TTL, || self.compute_token_total_locked_amount(token_id))
            .await
    }

    pub async fn compute_token_total_locked_amount(&self, token_id: &str) -> Result<BigDecimal, ComputeError> {
        let pairs = self.pair_addresses().await?;
        let amounts = try_join_all(pairs.iter().map(|pair| async move {
            let (first, second) = tokio::try_join!(
                self.pair_abi.first_token_id(pair),
                self.pair_abi.second_token_id(pair)
            )?;
            if first != token_id && second != token_id {
                return Ok::<_, ComputeError>(BigDecimal::zero());
            }

            let reserves = self.pair_abi.reserves(pair).await?;
            let mut amount = BigDecimal::zero();
            if first == token_id {
                amount += reserves.first_token_reserve;
            }
            if second == token_id {
                amount += reserves.second_token_reserve;
            }
            Ok(amount)
        }))
        .await?;

        Ok(amounts.into_iter().fold(BigDecimal::zero(), |acc, amount| acc + amount))
    }

    pub async fn set_token_total_locked_amount(&self, token_id: &str, amount: &BigDecimal) -> String {
        let key = self.cache.key("tokenTotalLocked").arg(token_id);
        self.cache.store().write_through(key, amount, LOCKED_TTL).await
    }

    /// Pair whose LP token is `lp_token_id`
    pub async fn pair_by_lp_token(&self, lp_token_id: &str) -> Result<String, ComputeError> {
        let key = self.cache.key("pairByLpToken").arg(lp_token_id);
        self.cache
            .wrap(key, CacheTtlInfo::CONTRACT_INFO, || async {
                let pairs = self.pair_addresses().await?;
                let lp_tokens = try_join_all(pairs.iter().map(|pair| self.pair_abi.lp_token_id(pair))).await?;
                pairs
                    .into_iter()
                    .zip(lp_tokens)
                    .find(|(_, lp)| lp == lp_token_id)
                    .map(|(pair, _)| pair)
                    .ok_or_else(|| ComputeError::NotFound(format!("no pair for LP token {}", lp_token_id)))
            })
            .await
    }

    /// Check a route before building transactions from it. Shape errors are
    /// raised before any ledger access; each hop's pair must then hold
    /// exactly the two tokens the route moves between.
    pub async fn validate_route(&self, route: &RouteSpec) -> Result<(), ComputeError> {
        check_route_shape(route)?;

        let hop_tokens = try_join_all(route.address_route.iter().map(|pair| async move {
            let (first, second) = tokio::try_join!(
                self.pair_abi.first_token_id(pair),
                self.pair_abi.second_token_id(pair)
            )?;
            Ok::<_, ComputeError>((first, second))
        }))
        .await?;

        for (index, (first, second)) in hop_tokens.iter().enumerate() {
            let token_in = &route.token_route[index];
            let token_out = &route.token_route[index + 1];
            let matches = (first == token_in && second == token_out) || (first == token_out && second == token_in);
            if !matches {
                return Err(ComputeError::InputMismatch(format!(
                    "pair {} holds {}/{} but hop {} swaps {} for {}",
                    route.address_route[index], first, second, index, token_in, token_out
                )));
            }
        }

        debug!("Validated route over {} hops", route.hops());
        Ok(())
    }

    pub async fn multi_pair_swap(&self, route: &RouteSpec) -> Result<MultiPairSwap, ComputeError> {
        self.validate_route(route).await?;
        build_multi_pair_swap(route)
    }
}
