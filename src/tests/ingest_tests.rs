//! Swap ingestion: recomputation, write-through, one invalidation per event

#[cfg(test)]
mod tests {
    use crate::blockchain::{start_event_polling, EventFeed, LedgerError, WorkerPool};
    use crate::compute::pair::PairSide;
    use crate::compute::ComputeError;
    use crate::db::TimeSeriesStore;
    use crate::models::{PairEvent, SwapEvent, SwapNoFeeEvent};
    use crate::tests::support::{dec, Fixture, MEX, USDC, WEGLD};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    /// 10 WEGLD sold for 394 USDC on the WEGLD/USDC pair
    fn wegld_for_usdc(pair: &str) -> SwapEvent {
        SwapEvent {
            pair_address: pair.to_string(),
            token_in_id: WEGLD.to_string(),
            token_out_id: USDC.to_string(),
            amount_in: dec("10000000000000000000"),
            amount_out: dec("394000000"),
            reserves_in_after: dec("1010000000000000000000"),
            reserves_out_after: dec("39606000000"),
            timestamp: crate::compute::now_secs(),
        }
    }

    #[tokio::test]
    async fn test_swap_writes_through_post_swap_values() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let pair = fixture.usdc_pair.clone();

        // Warm the pre-swap values so stale reads would show up
        assert_eq!(state.pairs.locked_value_usd(&pair).await.unwrap(), dec("80000"));

        let deltas = state
            .ingestor
            .process(&PairEvent::SwapFixedInput(wegld_for_usdc(&pair)))
            .await
            .unwrap()
            .unwrap();

        // 1 010 WEGLD at 40 plus 39 606 USDC at 1
        assert_eq!(deltas.pair.first_token_locked_value_usd, dec("40400"));
        assert_eq!(deltas.pair.second_token_locked_value_usd, dec("39606"));
        assert_eq!(deltas.pair.locked_value_usd, dec("80006"));
        assert_eq!(deltas.pair.volume_usd, dec("397"));
        assert_eq!(deltas.pair.fees_usd, dec("1.2"));
        assert_eq!(deltas.pair.liquidity, dec("100000000000000000000"));
        assert_eq!(deltas.factory.total_locked_value_usd, dec("120006"));

        assert_eq!(
            state.pairs.locked_value_usd(&pair).await.unwrap(),
            &deltas.pair.first_token_locked_value_usd + &deltas.pair.second_token_locked_value_usd
        );
        assert_eq!(
            state.pairs.first_token_price(&pair).await.unwrap(),
            deltas.pair.first_token_price
        );
        assert_eq!(state.router.total_locked_value_usd().await.unwrap(), dec("120006"));
    }

    #[tokio::test]
    async fn test_balanced_swap_locked_value_is_sum_of_sides() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let pair = fixture.usdc_pair.clone();

        // 10 WEGLD in, 400 USDC out, and the pool ends balanced at 40 000 per side
        let swap = SwapEvent {
            amount_out: dec("400000000"),
            reserves_in_after: dec("1000000000000000000000"),
            reserves_out_after: dec("40000000000"),
            ..wegld_for_usdc(&pair)
        };
        state.ingestor.process(&PairEvent::SwapFixedInput(swap)).await.unwrap();

        let first = state.pairs.token_locked_value_usd(&pair, PairSide::First).await.unwrap();
        let second = state.pairs.token_locked_value_usd(&pair, PairSide::Second).await.unwrap();
        assert_eq!(first, dec("40000"));
        assert_eq!(first, second);
        assert_eq!(state.pairs.locked_value_usd(&pair).await.unwrap(), &first + &second);
    }

    #[tokio::test]
    async fn test_failed_swap_still_publishes_the_written_reserves() {
        let fixture = Fixture::new().await;
        let pair = fixture.usdc_pair.clone();
        fixture.ledger.set_view(&pair, "getTotalFeePercent", vec![]);
        let state = fixture.state();

        let result = state
            .ingestor
            .process(&PairEvent::SwapFixedInput(wegld_for_usdc(&pair)))
            .await;
        assert!(matches!(result, Err(ComputeError::Ledger(_))));

        let published = fixture.bus.published();
        assert_eq!(published, vec![vec![format!("pair.reserves.{}", pair)]]);
        assert!(fixture.time_series.query_latest(&pair, "feesUSD").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_swap_publishes_keys_once_and_records_points() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let pair = fixture.usdc_pair.clone();

        state
            .ingestor
            .process(&PairEvent::SwapFixedOutput(wegld_for_usdc(&pair)))
            .await
            .unwrap();

        let published = fixture.bus.published();
        assert_eq!(published.len(), 1);
        assert!(published[0].contains(&format!("pair.lockedValueUSD.{}", pair)));
        assert!(published[0].contains(&format!("pair.reserves.{}", pair)));

        let fees = fixture.time_series.query_latest(&pair, "feesUSD").await.unwrap();
        assert_eq!(fees, Some(dec("1.2")));
        let volume = fixture.time_series.query_latest(WEGLD, "volumeUSD").await.unwrap();
        assert_eq!(volume, Some(dec("400")));
        let first_volume = fixture.time_series.query_latest(&pair, "firstTokenVolume").await.unwrap();
        assert_eq!(first_volume, Some(dec("10000000000000000000")));
        assert_eq!(
            state.pairs.token_volume(&pair, PairSide::Second, 24).await.unwrap(),
            dec("394000000")
        );
    }

    #[tokio::test]
    async fn test_no_fee_swap_is_only_forwarded() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let mut live = state.notifier.subscribe();

        let event = PairEvent::SwapNoFee(SwapNoFeeEvent {
            pair_address: fixture.mex_pair.clone(),
            token_in_id: MEX.to_string(),
            amount_in: dec("1000"),
            token_out_id: WEGLD.to_string(),
            timestamp: 1,
        });

        assert_eq!(state.ingestor.process(&event).await.unwrap(), None);
        assert_eq!(live.recv().await.unwrap().event, event);
        assert!(fixture.bus.published().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        let mut swap = wegld_for_usdc(&fixture.usdc_pair);
        swap.token_in_id = MEX.to_string();

        let result = state.ingestor.process(&PairEvent::SwapFixedInput(swap)).await;
        assert!(matches!(result, Err(ComputeError::InputMismatch(_))));
        assert!(fixture.bus.published().is_empty());
    }

    #[tokio::test]
    async fn test_worker_keeps_going_after_a_failed_event() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let pair = fixture.usdc_pair.clone();

        let pool = WorkerPool::new(state.ingestor.clone(), 2, 16, CancellationToken::new());
        let sender = pool.get_sender();

        let mut bad = wegld_for_usdc(&pair);
        bad.token_in_id = "NOPE-000000".to_string();
        sender.send(PairEvent::SwapFixedInput(bad)).await.unwrap();
        sender
            .send(PairEvent::SwapFixedInput(wegld_for_usdc(&pair)))
            .await
            .unwrap();
        drop(sender);
        pool.join().await;

        let fees = fixture.time_series.query_latest(&pair, "feesUSD").await.unwrap();
        assert_eq!(fees, Some(dec("1.2")));
        assert_eq!(fixture.bus.published().len(), 1);
    }

    /// Fails its first fetch, then serves two events from cursor 0
    struct FlakyFeed {
        pair: String,
        cursors: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl EventFeed for FlakyFeed {
        async fn fetch_events(&self, from: u64, _size: usize) -> Result<Vec<PairEvent>, LedgerError> {
            let mut cursors = self.cursors.lock();
            cursors.push(from);
            if cursors.len() == 1 {
                return Err(LedgerError::Decode("gateway timeout".to_string()));
            }
            if from > 0 {
                return Ok(Vec::new());
            }
            Ok(vec![
                PairEvent::SwapFixedInput(wegld_for_usdc(&self.pair)),
                PairEvent::SwapFixedOutput(wegld_for_usdc(&self.pair)),
            ])
        }
    }

    #[tokio::test]
    async fn test_polling_retries_and_advances_the_cursor() {
        let feed = Arc::new(FlakyFeed {
            pair: "p".to_string(),
            cursors: Mutex::new(Vec::new()),
        });
        let (sender, mut receiver) = mpsc::channel(8);
        let shutdown = CancellationToken::new();

        let poller = tokio::spawn(start_event_polling(
            feed.clone(),
            sender,
            Duration::from_millis(20),
            10,
            shutdown.clone(),
        ));

        assert!(matches!(receiver.recv().await, Some(PairEvent::SwapFixedInput(_))));
        assert!(matches!(receiver.recv().await, Some(PairEvent::SwapFixedOutput(_))));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        poller.await.unwrap();

        let cursors = feed.cursors.lock().clone();
        assert_eq!(&cursors[..2], &[0, 0]);
        assert!(cursors[2..].iter().all(|cursor| *cursor == 2));
        assert!(cursors.len() > 2);
    }
}
