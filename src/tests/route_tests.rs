//! Multi-hop tolerance distribution and route validation

#[cfg(test)]
mod tests {
    use crate::compute::route::{build_multi_pair_swap, distribute_tolerance, gas_limit};
    use crate::compute::ComputeError;
    use crate::models::{RouteSpec, SwapType};
    use crate::tests::support::{address, dec, Fixture, MEX, USDC, WEGLD};

    fn three_hop_route(swap_type: SwapType) -> RouteSpec {
        RouteSpec {
            swap_type,
            address_route: vec![address(20), address(21), address(22)],
            token_route: vec![
                "A-000001".to_string(),
                "B-000002".to_string(),
                "C-000003".to_string(),
                "D-000004".to_string(),
            ],
            intermediary_amounts: vec![dec("1000"), dec("500"), dec("200"), dec("80")],
            tolerance: dec("0.03"),
        }
    }

    #[test]
    fn test_fixed_input_earlier_hops_absorb_more_tolerance() {
        let swaps = distribute_tolerance(&three_hop_route(SwapType::FixedInput)).unwrap();
        let amounts: Vec<_> = swaps.iter().map(|swap| swap.amount.clone()).collect();

        // 500 - 500*0.03, 200 - 200*0.02, 80 - 80*0.01
        assert_eq!(amounts, vec![dec("485"), dec("196"), dec("79")]);
        assert_eq!(swaps[0].endpoint, "swapTokensFixedInput");
        assert_eq!(swaps[2].token_out, "D-000004");
    }

    #[test]
    fn test_fixed_output_final_hop_has_no_padding() {
        let route = three_hop_route(SwapType::FixedOutput);
        let swaps = distribute_tolerance(&route).unwrap();
        let amounts: Vec<_> = swaps.iter().map(|swap| swap.amount.clone()).collect();

        // 500 + 500*0.02, 200 + 200*0.01, 80 exactly
        assert_eq!(amounts, vec![dec("510"), dec("202"), dec("80")]);

        let swap = build_multi_pair_swap(&route).unwrap();
        assert_eq!(swap.amount_in, dec("1030"));
        assert_eq!(swap.gas_limit, gas_limit(3));
        assert_eq!(gas_limit(3), 75_000_000);
    }

    #[test]
    fn test_route_shape_errors() {
        let mut route = three_hop_route(SwapType::FixedInput);
        route.token_route.pop();
        assert!(matches!(distribute_tolerance(&route), Err(ComputeError::InputMismatch(_))));

        let mut route = three_hop_route(SwapType::FixedInput);
        route.intermediary_amounts.pop();
        assert!(matches!(distribute_tolerance(&route), Err(ComputeError::InputMismatch(_))));

        let mut route = three_hop_route(SwapType::FixedInput);
        route.tolerance = dec("1.5");
        assert!(matches!(distribute_tolerance(&route), Err(ComputeError::Validation(_))));

        let mut route = three_hop_route(SwapType::FixedInput);
        route.address_route[1] = "not-an-address".to_string();
        assert!(matches!(distribute_tolerance(&route), Err(ComputeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_raised_before_ledger_access() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        let mut route = three_hop_route(SwapType::FixedInput);
        route.token_route.pop();

        let result = state.router.validate_route(&route).await;
        assert!(matches!(result, Err(ComputeError::InputMismatch(_))));
        assert_eq!(fixture.ledger.calls(), 0);
    }

    #[tokio::test]
    async fn test_route_through_wrong_pair_is_rejected() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        // USDC -> WEGLD through the WEGLD/USDC pair, then WEGLD -> MEX through the same pair
        let route = RouteSpec {
            swap_type: SwapType::FixedInput,
            address_route: vec![fixture.usdc_pair.clone(), fixture.usdc_pair.clone()],
            token_route: vec![USDC.to_string(), WEGLD.to_string(), MEX.to_string()],
            intermediary_amounts: vec![dec("40000000"), dec("1000000000000000000"), dec("2000000000000000000000")],
            tolerance: dec("0.01"),
        };

        let result = state.router.multi_pair_swap(&route).await;
        assert!(matches!(result, Err(ComputeError::InputMismatch(_))));
    }

    #[tokio::test]
    async fn test_valid_route_builds_swap() {
        let fixture = Fixture::new().await;
        let state = fixture.state();

        let route = RouteSpec {
            swap_type: SwapType::FixedInput,
            address_route: vec![fixture.usdc_pair.clone(), fixture.mex_pair.clone()],
            token_route: vec![USDC.to_string(), WEGLD.to_string(), MEX.to_string()],
            intermediary_amounts: vec![dec("40000000"), dec("1000000000000000000"), dec("2000000000000000000000")],
            tolerance: dec("0.01"),
        };

        let swap = state.router.multi_pair_swap(&route).await.unwrap();
        assert_eq!(swap.token_in, USDC);
        assert_eq!(swap.amount_in, dec("40000000"));
        assert_eq!(swap.swaps.len(), 2);
        assert_eq!(swap.swaps[0].amount, dec("990000000000000000"));
        assert_eq!(swap.swaps[1].amount, dec("1990000000000000000000"));
    }
}
