use super::amm::{checked_div, pow10, quote};
use super::token::TokenService;
use super::usd::{compute_value_usd, denominate, normalize_usd};
use super::{now_secs, ComputeError};
use crate::cache::{CacheAside, CacheStore, CacheTtlInfo, TtlPair};
use crate::contracts::PairAbi;
use crate::db::{TimeBucket, TimeSeriesStore};
use crate::models::{PairReserveSnapshot, Token};
use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;

const PRICE_TTL: TtlPair = CacheTtlInfo::PRICE;
const ANALYTICS_TTL: TtlPair = CacheTtlInfo::ANALYTICS;

pub const VOLUME_USD_METRIC: &str = "volumeUSD";
pub const FEES_USD_METRIC: &str = "feesUSD";
pub const FIRST_TOKEN_VOLUME_METRIC: &str = "firstTokenVolume";
pub const SECOND_TOKEN_VOLUME_METRIC: &str = "secondTokenVolume";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    First,
    Second,
}

impl PairSide {
    fn prefix(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
        }
    }

    /// Series metric holding this side's traded amounts, in token units
    pub fn volume_metric(&self) -> &'static str {
        match self {
            Self::First => FIRST_TOKEN_VOLUME_METRIC,
            Self::Second => SECOND_TOKEN_VOLUME_METRIC,
        }
    }
}

/// Derived pair metrics, cached under the `pair` namespace.
///
/// USD values are normalized by the reference stable coin price; token
/// USD prices stay in raw oracle units.
pub struct PairCompute {
    cache: CacheAside,
    pair_abi: PairAbi,
    tokens: Arc<TokenService>,
    time_series: Arc<dyn TimeSeriesStore>,
}

impl PairCompute {
    pub fn new(
        store: Arc<CacheStore>,
        pair_abi: PairAbi,
        tokens: Arc<TokenService>,
        time_series: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, "pair"),
            pair_abi,
            tokens,
            time_series,
        }
    }

    pub fn pair_abi(&self) -> &PairAbi {
        &self.pair_abi
    }

    pub async fn first_token(&self, pair: &str) -> Result<Token, ComputeError> {
        let identifier = self.pair_abi.first_token_id(pair).await?;
        self.tokens.token(&identifier).await
    }

    pub async fn second_token(&self, pair: &str) -> Result<Token, ComputeError> {
        let identifier = self.pair_abi.second_token_id(pair).await?;
        self.tokens.token(&identifier).await
    }

    pub async fn token(&self, pair: &str, side: PairSide) -> Result<Token, ComputeError> {
        match side {
            PairSide::First => self.first_token(pair).await,
            PairSide::Second => self.second_token(pair).await,
        }
    }

    async fn tokens_and_reserves(&self, pair: &str) -> Result<(Token, Token, PairReserveSnapshot), ComputeError> {
        let (first, second, reserves) = tokio::try_join!(
            self.first_token(pair),
            self.second_token(pair),
            async { Ok::<_, ComputeError>(self.pair_abi.reserves(pair).await?) }
        )?;
        Ok((first, second, reserves))
    }

    // Token prices in terms of the other token

    /// Price of one whole unit of the `side` token in the other token
    pub async fn token_price(&self, pair: &str, side: PairSide) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key(&format!("{}TokenPrice", side.prefix())).arg(pair);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_token_price(pair, side))
            .await
    }

    pub async fn compute_token_price(&self, pair: &str, side: PairSide) -> Result<BigDecimal, ComputeError> {
        let (first, second, reserves) = self.tokens_and_reserves(pair).await?;
        let (token, other, reserve_in, reserve_out) = match side {
            PairSide::First => (
                first,
                second,
                reserves.first_token_reserve,
                reserves.second_token_reserve,
            ),
            PairSide::Second => (
                second,
                first,
                reserves.second_token_reserve,
                reserves.first_token_reserve,
            ),
        };

        let one_unit = pow10(i64::from(token.decimals));
        let price = quote(&one_unit, &reserve_in, &reserve_out)?;
        Ok(price * pow10(-i64::from(other.decimals)))
    }

    pub async fn set_token_price(&self, pair: &str, side: PairSide, price: &BigDecimal) -> String {
        let key = self.cache.key(&format!("{}TokenPrice", side.prefix())).arg(pair);
        self.cache.store().write_through(key, price, PRICE_TTL).await
    }

    pub async fn first_token_price(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        self.token_price(pair, PairSide::First).await
    }

    pub async fn second_token_price(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        self.token_price(pair, PairSide::Second).await
    }

    // Token USD prices

    pub async fn token_price_usd(&self, pair: &str, side: PairSide) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key(&format!("{}TokenPriceUSD", side.prefix())).arg(pair);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_token_price_usd(pair, side))
            .await
    }

    pub async fn compute_token_price_usd(&self, pair: &str, side: PairSide) -> Result<BigDecimal, ComputeError> {
        let token = self.token(pair, side).await?;
        self.tokens.compute_token_price_usd(&token.identifier).await
    }

    pub async fn set_token_price_usd(&self, pair: &str, side: PairSide, price: &BigDecimal) -> String {
        let key = self.cache.key(&format!("{}TokenPriceUSD", side.prefix())).arg(pair);
        self.cache.store().write_through(key, price, PRICE_TTL).await
    }

    // Locked value

    pub async fn token_locked_value_usd(&self, pair: &str, side: PairSide) -> Result<BigDecimal, ComputeError> {
        let key = self
            .cache
            .key(&format!("{}TokenLockedValueUSD", side.prefix()))
            .arg(pair);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_token_locked_value_usd(pair, side))
            .await
    }

    pub async fn compute_token_locked_value_usd(&self, pair: &str, side: PairSide) -> Result<BigDecimal, ComputeError> {
        let (token, reserves, price_usd, reference) = tokio::try_join!(
            self.token(pair, side),
            async { Ok::<_, ComputeError>(self.pair_abi.reserves(pair).await?) },
            self.token_price_usd(pair, side),
            self.tokens.reference_price()
        )?;
        let reserve = match side {
            PairSide::First => &reserves.first_token_reserve,
            PairSide::Second => &reserves.second_token_reserve,
        };
        normalize_usd(&compute_value_usd(reserve, token.decimals, &price_usd), &reference)
    }

    pub async fn set_token_locked_value_usd(&self, pair: &str, side: PairSide, value: &BigDecimal) -> String {
        let key = self
            .cache
            .key(&format!("{}TokenLockedValueUSD", side.prefix()))
            .arg(pair);
        self.cache.store().write_through(key, value, PRICE_TTL).await
    }

    /// Sum of both sides' locked value
    pub async fn locked_value_usd(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("lockedValueUSD").arg(pair);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_locked_value_usd(pair))
            .await
    }

    pub async fn compute_locked_value_usd(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        let (first, second) = tokio::try_join!(
            self.token_locked_value_usd(pair, PairSide::First),
            self.token_locked_value_usd(pair, PairSide::Second)
        )?;
        Ok(first + second)
    }

    pub async fn set_locked_value_usd(&self, pair: &str, value: &BigDecimal) -> String {
        let key = self.cache.key("lockedValueUSD").arg(pair);
        self.cache.store().write_through(key, value, PRICE_TTL).await
    }

    /// USD value of one whole LP token
    pub async fn lp_token_price_usd(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("lpTokenPriceUSD").arg(pair);
        self.cache
            .wrap(key, PRICE_TTL, || self.compute_lp_token_price_usd(pair))
            .await
    }

    pub async fn compute_lp_token_price_usd(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        let lp_token_id = self.pair_abi.lp_token_id(pair).await?;
        let (lp_token, reserves, locked_value) = tokio::try_join!(
            self.tokens.token(&lp_token_id),
            async { Ok::<_, ComputeError>(self.pair_abi.reserves(pair).await?) },
            self.locked_value_usd(pair)
        )?;

        let supply = denominate(&reserves.lp_supply, lp_token.decimals);
        if supply.is_zero() {
            return Ok(BigDecimal::zero());
        }
        checked_div(&locked_value, &supply)
    }

    // Windowed analytics

    pub async fn volume_usd(&self, pair: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        self.windowed(pair, VOLUME_USD_METRIC, hours).await
    }

    pub async fn fees_usd(&self, pair: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        self.windowed(pair, FEES_USD_METRIC, hours).await
    }

    /// Traded amount of one side over the last `hours`, in raw token units
    pub async fn token_volume(&self, pair: &str, side: PairSide, hours: i64) -> Result<BigDecimal, ComputeError> {
        self.windowed(pair, side.volume_metric(), hours).await
    }

    pub async fn set_token_volume(&self, pair: &str, side: PairSide, hours: i64, value: &BigDecimal) -> String {
        let key = self.cache.key(side.volume_metric()).arg(pair).arg(format!("{}h", hours));
        self.cache.store().write_through(key, value, ANALYTICS_TTL).await
    }

    pub async fn set_volume_usd(&self, pair: &str, hours: i64, value: &BigDecimal) -> String {
        let key = self.cache.key(VOLUME_USD_METRIC).arg(pair).arg(format!("{}h", hours));
        self.cache.store().write_through(key, value, ANALYTICS_TTL).await
    }

    pub async fn set_fees_usd(&self, pair: &str, hours: i64, value: &BigDecimal) -> String {
        let key = self.cache.key(FEES_USD_METRIC).arg(pair).arg(format!("{}h", hours));
        self.cache.store().write_through(key, value, ANALYTICS_TTL).await
    }

    async fn windowed(&self, pair: &str, metric: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key(metric).arg(pair).arg(format!("{}h", hours));
        self.cache
            .wrap(key, ANALYTICS_TTL, || self.compute_windowed(pair, metric, hours))
            .await
    }

    /// Sum of hourly buckets over the last `hours`
    pub async fn compute_windowed(&self, pair: &str, metric: &str, hours: i64) -> Result<BigDecimal, ComputeError> {
        let start = now_secs() - hours * TimeBucket::Hour.seconds();
        let points = self
            .time_series
            .query_aggregate(pair, metric, TimeBucket::Hour, start)
            .await?;
        Ok(points
            .into_iter()
            .fold(BigDecimal::zero(), |acc, point| acc + point.value))
    }

    /// Yearly fee yield on the locked value, from the last 24h of fees
    pub async fn fees_apr(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        let key = self.cache.key("feesAPR").arg(pair);
        self.cache
            .wrap(key, ANALYTICS_TTL, || self.compute_fees_apr(pair))
            .await
    }

    pub async fn compute_fees_apr(&self, pair: &str) -> Result<BigDecimal, ComputeError> {
        let (fees, locked_value) = tokio::try_join!(self.fees_usd(pair, 24), self.locked_value_usd(pair))?;
        if locked_value.is_zero() {
            return Ok(BigDecimal::zero());
        }
        checked_div(&(fees * BigDecimal::from(365)), &locked_value)
    }

    pub async fn set_fees_apr(&self, pair: &str, value: &BigDecimal) -> String {
        let key = self.cache.key("feesAPR").arg(pair);
        self.cache.store().write_through(key, value, ANALYTICS_TTL).await
    }
}
