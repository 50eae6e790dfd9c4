use crate::blockchain::notifier::EventNotifier;
use crate::cache::{InvalidatedKeys, InvalidationBus};
use crate::compute::amm::fee_fraction;
use crate::compute::pair::{
    PairCompute, PairSide, FEES_USD_METRIC, FIRST_TOKEN_VOLUME_METRIC, SECOND_TOKEN_VOLUME_METRIC, VOLUME_USD_METRIC,
};
use crate::compute::router::RouterCompute;
use crate::compute::token::TokenService;
use crate::compute::usd::{compute_value_usd, normalize_usd};
use crate::compute::ComputeError;
use crate::db::TimeSeriesStore;
use crate::models::{FactoryDelta, PairDelta, PairEvent, PairReserveSnapshot, SwapDeltas, SwapEvent, TokenDelta};
use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Recomputes the metrics a swap changes and writes them through the cache
pub struct EventIngestor {
    pairs: Arc<PairCompute>,
    router: Arc<RouterCompute>,
    tokens: Arc<TokenService>,
    bus: Arc<dyn InvalidationBus>,
    notifier: Arc<EventNotifier>,
    time_series: Arc<dyn TimeSeriesStore>,
}

impl EventIngestor {
    pub fn new(
        pairs: Arc<PairCompute>,
        router: Arc<RouterCompute>,
        tokens: Arc<TokenService>,
        bus: Arc<dyn InvalidationBus>,
        notifier: Arc<EventNotifier>,
        time_series: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            pairs,
            router,
            tokens,
            bus,
            notifier,
            time_series,
        }
    }

    /// Handle one event. Fee-less swaps are only forwarded to live
    /// subscribers and produce no deltas.
    pub async fn process(&self, event: &PairEvent) -> Result<Option<SwapDeltas>, ComputeError> {
        match event {
            PairEvent::SwapFixedInput(swap) | PairEvent::SwapFixedOutput(swap) => {
                let deltas = self.process_swap(swap).await?;
                self.notifier.notify(event);
                self.record_points(&deltas).await;
                Ok(Some(deltas))
            }
            PairEvent::SwapNoFee(_) => {
                self.notifier.notify(event);
                Ok(None)
            }
        }
    }

    /// Keys written before a failure are still published
    async fn process_swap(&self, event: &SwapEvent) -> Result<SwapDeltas, ComputeError> {
        let pair = event.pair_address.as_str();
        let mut invalidated = InvalidatedKeys::new();
        let result = self.apply_swap(event, &mut invalidated).await;

        match invalidated.flush(self.bus.as_ref()).await {
            Ok(count) => debug!("Invalidated {} keys after swap on {}", count, pair),
            Err(e) => warn!("Failed to publish invalidated keys for {}: {}", pair, e),
        }

        if result.is_ok() {
            info!(
                "Ingested swap on {}: {} {} for {}",
                pair, event.amount_in, event.token_in_id, event.token_out_id
            );
        }
        result
    }

    async fn apply_swap(&self, event: &SwapEvent, invalidated: &mut InvalidatedKeys) -> Result<SwapDeltas, ComputeError> {
        let pair = event.pair_address.as_str();
        let (first_token, second_token) = tokio::try_join!(self.pairs.first_token(pair), self.pairs.second_token(pair))?;

        let in_is_first = if event.token_in_id == first_token.identifier {
            true
        } else if event.token_in_id == second_token.identifier {
            false
        } else {
            return Err(ComputeError::InputMismatch(format!(
                "token {} is not traded by pair {}",
                event.token_in_id, pair
            )));
        };

        let (first_volume, second_volume, first_reserve, second_reserve) = if in_is_first {
            (
                event.amount_in.clone(),
                event.amount_out.clone(),
                event.reserves_in_after.clone(),
                event.reserves_out_after.clone(),
            )
        } else {
            (
                event.amount_out.clone(),
                event.amount_in.clone(),
                event.reserves_out_after.clone(),
                event.reserves_in_after.clone(),
            )
        };

        // Every recomputation below must see post-swap reserves
        let previous = self.pairs.pair_abi().reserves(pair).await?;
        let snapshot = PairReserveSnapshot {
            pair_address: pair.to_string(),
            first_token_reserve: first_reserve.clone(),
            second_token_reserve: second_reserve.clone(),
            lp_supply: previous.lp_supply,
        };
        invalidated.push(self.pairs.pair_abi().set_reserves(&snapshot).await);

        let (first_price, second_price, first_price_usd, second_price_usd, fee_percent, reference) = tokio::try_join!(
            self.pairs.compute_token_price(pair, PairSide::First),
            self.pairs.compute_token_price(pair, PairSide::Second),
            self.pairs.compute_token_price_usd(pair, PairSide::First),
            self.pairs.compute_token_price_usd(pair, PairSide::Second),
            async { Ok::<_, ComputeError>(self.pairs.pair_abi().total_fee_percent(pair).await?) },
            self.tokens.reference_price()
        )?;

        let usd = |amount: &BigDecimal, decimals: u32, price: &BigDecimal| {
            normalize_usd(&compute_value_usd(amount, decimals, price), &reference)
        };

        let first_locked_usd = usd(&first_reserve, first_token.decimals, &first_price_usd)?;
        let second_locked_usd = usd(&second_reserve, second_token.decimals, &second_price_usd)?;
        let locked_value_usd = &first_locked_usd + &second_locked_usd;

        let first_volume_usd = usd(&first_volume, first_token.decimals, &first_price_usd)?;
        let second_volume_usd = usd(&second_volume, second_token.decimals, &second_price_usd)?;
        let volume_usd = (&first_volume_usd + &second_volume_usd) / BigDecimal::from(2);

        let paid_in_usd = if in_is_first { &first_volume_usd } else { &second_volume_usd };
        let fees_usd = paid_in_usd * fee_fraction(fee_percent);

        let (total_locked_value_usd, first_total_locked, second_total_locked) = tokio::try_join!(
            self.router
                .compute_total_locked_value_usd(Some((pair, &locked_value_usd))),
            self.router.compute_token_total_locked_amount(&first_token.identifier),
            self.router.compute_token_total_locked_amount(&second_token.identifier)
        )?;

        let deltas = SwapDeltas {
            pair: PairDelta {
                pair_address: pair.to_string(),
                first_token_price: first_price.clone(),
                second_token_price: second_price.clone(),
                first_token_locked: first_reserve,
                second_token_locked: second_reserve,
                first_token_locked_value_usd: first_locked_usd.clone(),
                second_token_locked_value_usd: second_locked_usd.clone(),
                first_token_volume: first_volume.clone(),
                second_token_volume: second_volume.clone(),
                locked_value_usd: locked_value_usd.clone(),
                liquidity: snapshot.lp_supply.clone(),
                volume_usd,
                fees_usd,
            },
            first_token: TokenDelta {
                token_id: first_token.identifier.clone(),
                locked_value_usd: usd(&first_total_locked, first_token.decimals, &first_price_usd)?,
                locked_value: first_total_locked,
                price_usd: normalize_usd(&first_price_usd, &reference)?,
                volume: first_volume,
                volume_usd: first_volume_usd,
            },
            second_token: TokenDelta {
                token_id: second_token.identifier.clone(),
                locked_value_usd: usd(&second_total_locked, second_token.decimals, &second_price_usd)?,
                locked_value: second_total_locked,
                price_usd: normalize_usd(&second_price_usd, &reference)?,
                volume: second_volume,
                volume_usd: second_volume_usd,
            },
            factory: FactoryDelta { total_locked_value_usd },
            timestamp: event.timestamp,
        };

        let pair_keys = tokio::join!(
            self.pairs.set_token_price(pair, PairSide::First, &first_price),
            self.pairs.set_token_price(pair, PairSide::Second, &second_price),
            self.pairs.set_token_price_usd(pair, PairSide::First, &first_price_usd),
            self.pairs.set_token_price_usd(pair, PairSide::Second, &second_price_usd),
            self.pairs.set_token_locked_value_usd(pair, PairSide::First, &first_locked_usd),
            self.pairs.set_token_locked_value_usd(pair, PairSide::Second, &second_locked_usd),
            self.pairs.set_locked_value_usd(pair, &locked_value_usd),
        );
        invalidated.extend([pair_keys.0, pair_keys.1, pair_keys.2, pair_keys.3, pair_keys.4, pair_keys.5, pair_keys.6]);

        let token_keys = tokio::join!(
            self.tokens.set_token_price_usd(&first_token.identifier, &first_price_usd),
            self.tokens.set_token_price_usd(&second_token.identifier, &second_price_usd),
            self.router
                .set_token_total_locked_amount(&first_token.identifier, &deltas.first_token.locked_value),
            self.router
                .set_token_total_locked_amount(&second_token.identifier, &deltas.second_token.locked_value),
            self.router
                .set_total_locked_value_usd(&deltas.factory.total_locked_value_usd),
        );
        invalidated.extend([token_keys.0, token_keys.1, token_keys.2, token_keys.3, token_keys.4]);

        Ok(deltas)
    }

    /// Append volume and fee points so windowed aggregates include this swap
    async fn record_points(&self, deltas: &SwapDeltas) {
        let points = [
            (deltas.pair.pair_address.as_str(), VOLUME_USD_METRIC, &deltas.pair.volume_usd),
            (deltas.pair.pair_address.as_str(), FEES_USD_METRIC, &deltas.pair.fees_usd),
            (deltas.pair.pair_address.as_str(), FIRST_TOKEN_VOLUME_METRIC, &deltas.pair.first_token_volume),
            (deltas.pair.pair_address.as_str(), SECOND_TOKEN_VOLUME_METRIC, &deltas.pair.second_token_volume),
            (deltas.first_token.token_id.as_str(), VOLUME_USD_METRIC, &deltas.first_token.volume_usd),
            (deltas.second_token.token_id.as_str(), VOLUME_USD_METRIC, &deltas.second_token.volume_usd),
        ];

        for (series, metric, value) in points {
            if let Err(e) = self.time_series.record(series, metric, deltas.timestamp, value).await {
                warn!("Failed to record {} for {}: {}", metric, series, e);
            }
        }
    }
}
