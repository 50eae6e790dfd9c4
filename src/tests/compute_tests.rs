//! Derived prices and locked values over the two-pair fixture

#[cfg(test)]
mod tests {
    use crate::compute::pair::PairSide;
    use crate::compute::ComputeError;
    use crate::db::{TimeBucket, TimeSeriesStore};
    use crate::tests::support::{address, biguint, dec, string_bytes, u64_bytes, Fixture, EGLD_MEX_LP, MEX, USDC, WEGLD};
    use bigdecimal::{BigDecimal, Zero};

    #[tokio::test]
    async fn test_token_price_from_oracle_and_through_pair() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        assert_eq!(state.tokens.token_price_usd(WEGLD).await.unwrap(), dec("40"));
        // 1 MEX = 0.0005 WEGLD = 0.02 USD
        assert_eq!(state.tokens.token_price_usd(MEX).await.unwrap(), dec("0.02"));

        let unknown = state.tokens.token_price_usd("NOPE-000000").await;
        assert!(matches!(unknown, Err(ComputeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pair_prices_and_locked_value() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let pair = fixture.usdc_pair.as_str();

        assert_eq!(state.pairs.first_token_price(pair).await.unwrap(), dec("40"));
        assert_eq!(state.pairs.second_token_price(pair).await.unwrap(), dec("0.025"));
        assert_eq!(
            state.pairs.token_price_usd(pair, PairSide::Second).await.unwrap(),
            dec("1")
        );

        let first = state.pairs.token_locked_value_usd(pair, PairSide::First).await.unwrap();
        let second = state.pairs.token_locked_value_usd(pair, PairSide::Second).await.unwrap();
        assert_eq!(first, dec("40000"));
        assert_eq!(second, dec("40000"));
        assert_eq!(state.pairs.locked_value_usd(pair).await.unwrap(), dec("80000"));
        assert_eq!(state.pairs.lp_token_price_usd(pair).await.unwrap(), dec("800"));
    }

    #[tokio::test]
    async fn test_usd_values_are_normalized_by_reference_price() {
        let fixture = Fixture::new().await;
        fixture.oracle.set_price("USDC", "0.5");
        let state = fixture.state();

        // 40 000 + 20 000 raw USD, divided by the 0.5 reference
        let locked = state.pairs.locked_value_usd(&fixture.usdc_pair).await.unwrap();
        assert_eq!(locked, dec("120000"));
    }

    #[tokio::test]
    async fn test_cached_reads_skip_the_ledger() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        state.pairs.locked_value_usd(&fixture.usdc_pair).await.unwrap();
        let ledger_calls = fixture.ledger.calls();
        let oracle_calls = fixture.oracle.calls();

        state.pairs.locked_value_usd(&fixture.usdc_pair).await.unwrap();
        assert_eq!(fixture.ledger.calls(), ledger_calls);
        assert_eq!(fixture.oracle.calls(), oracle_calls);
    }

    #[tokio::test]
    async fn test_router_aggregates() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        assert_eq!(state.router.total_locked_value_usd().await.unwrap(), dec("120000"));
        assert_eq!(
            state.router.token_total_locked_amount(WEGLD).await.unwrap(),
            dec("1500000000000000000000")
        );
        assert_eq!(state.router.pair_by_lp_token(EGLD_MEX_LP).await.unwrap(), fixture.mex_pair);
        assert!(matches!(
            state.router.pair_by_lp_token("NOPE-000000").await,
            Err(ComputeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fees_apr_from_recorded_fees() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let pair = fixture.usdc_pair.as_str();

        assert_eq!(state.pairs.fees_apr(&fixture.mex_pair).await.unwrap(), BigDecimal::zero());

        let now = crate::compute::now_secs();
        fixture.time_series.record(pair, "feesUSD", now - 60, &dec("30")).await.unwrap();
        fixture.time_series.record(pair, "feesUSD", now - 30, &dec("10")).await.unwrap();
        // Older than the window
        fixture
            .time_series
            .record(pair, "feesUSD", now - 2 * TimeBucket::Day.seconds(), &dec("1000"))
            .await
            .unwrap();

        assert_eq!(state.pairs.compute_windowed(pair, "feesUSD", 24).await.unwrap(), dec("40"));
        // 40 * 365 / 80 000
        assert_eq!(state.pairs.compute_fees_apr(pair).await.unwrap(), dec("0.1825"));
    }

    #[tokio::test]
    async fn test_price_discovery_prices_and_redeem_phase() {
        let fixture = Fixture::new().await;
        let contract = address(70);
        fixture.ledger.set_view(&contract, "getLaunchedTokenId", vec![string_bytes(MEX)]);
        fixture.ledger.set_view(&contract, "getAcceptedTokenId", vec![string_bytes(USDC)]);
        fixture
            .ledger
            .set_view(&contract, "getLaunchedTokenBalance", vec![biguint("1000000000000000000000")]);
        fixture
            .ledger
            .set_view(&contract, "getAcceptedTokenBalance", vec![biguint("500000000")]);
        fixture.ledger.set_view(&contract, "getCurrentPhase", vec![u64_bytes(1)]);

        let state = fixture.state();
        // 1000 MEX against 500 USDC
        assert_eq!(state.price_discovery.launched_token_price(&contract).await.unwrap(), dec("0.5"));
        assert_eq!(state.price_discovery.accepted_token_price(&contract).await.unwrap(), dec("2"));
        assert_eq!(state.price_discovery.launched_token_price_usd(&contract).await.unwrap(), dec("0.5"));
        assert_eq!(state.price_discovery.accepted_token_price_usd(&contract).await.unwrap(), dec("1"));

        let redeemed = address(71);
        fixture.ledger.set_view(&redeemed, "getCurrentPhase", vec![u64_bytes(5)]);
        fixture
            .time_series
            .record(&redeemed, "launchedTokenPrice", 100, &dec("0.75"))
            .await
            .unwrap();

        assert_eq!(state.price_discovery.launched_token_price(&redeemed).await.unwrap(), dec("0.75"));
        assert_eq!(
            state.price_discovery.accepted_token_price(&redeemed).await.unwrap(),
            BigDecimal::zero()
        );

        let closing = state
            .price_discovery
            .closing_values(&redeemed, "launchedTokenPrice", TimeBucket::Hour)
            .await
            .unwrap();
        assert_eq!(closing.len(), 1);
        assert_eq!(closing[0].value, dec("0.75"));
    }

    #[tokio::test]
    async fn test_analytics_setters_and_burned_sums() {
        let fixture = Fixture::new().await;
        let state = fixture.state();
        let analytics = &state.analytics;

        // Staking figures only exist once something sets them
        assert!(matches!(
            analytics.total_value_staked_usd().await,
            Err(ComputeError::NotFound(_))
        ));
        let key = analytics.set_total_value_staked_usd(&dec("2500")).await;
        assert_eq!(key, "analytics.totalValueStakedUSD");
        assert_eq!(analytics.total_value_staked_usd().await.unwrap(), dec("2500"));

        analytics.set_total_aggregated_rewards(30, &dec("900")).await;
        assert_eq!(analytics.total_aggregated_rewards(30).await.unwrap(), dec("900"));
        assert!(analytics.total_aggregated_rewards(7).await.is_err());

        analytics.set_total_locked_mex_staked_usd(&dec("12.5")).await;
        assert_eq!(analytics.total_locked_mex_staked_usd().await.unwrap(), dec("12.5"));

        let now = crate::compute::now_secs();
        fixture.time_series.record(MEX, "feeBurned", now - 20, &dec("3")).await.unwrap();
        fixture.time_series.record(MEX, "feeBurned", now - 10, &dec("5")).await.unwrap();
        assert_eq!(analytics.fee_token_burned(MEX, 24).await.unwrap(), dec("8"));
        assert_eq!(analytics.penalty_token_burned(MEX, 24).await.unwrap(), BigDecimal::zero());

        let key = analytics.set_penalty_token_burned(MEX, 24, &dec("1")).await;
        assert_eq!(key, format!("analytics.penaltyTokenBurned.{}.24h", MEX));
        assert_eq!(analytics.penalty_token_burned(MEX, 24).await.unwrap(), dec("1"));
    }
}
