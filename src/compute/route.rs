//! Slippage tolerance split across the hops of a multi-pair swap.
//!
//! Earlier hops absorb a larger share of the total tolerance so that a
//! shortfall on the first hop does not make every later hop fail.

use super::amm::trunc;
use super::ComputeError;
use crate::models::{HopSwap, MultiPairSwap, RouteSpec, SwapType};
use crate::validation::{validate_address, validate_tolerance};
use bigdecimal::BigDecimal;

pub const MULTI_PAIR_SWAP_GAS_MULTIPLIER: u64 = 25_000_000;

/// Structural checks that need no ledger access
pub fn check_route_shape(route: &RouteSpec) -> Result<(), ComputeError> {
    let hops = route.hops();
    if hops == 0 {
        return Err(ComputeError::InputMismatch("route has no hops".to_string()));
    }
    if route.token_route.len() != hops + 1 {
        return Err(ComputeError::InputMismatch(format!(
            "{} hops need {} route tokens, got {}",
            hops,
            hops + 1,
            route.token_route.len()
        )));
    }
    if route.intermediary_amounts.len() != hops + 1 {
        return Err(ComputeError::InputMismatch(format!(
            "{} hops need {} intermediary amounts, got {}",
            hops,
            hops + 1,
            route.intermediary_amounts.len()
        )));
    }
    if route.token_route.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(ComputeError::InputMismatch(
            "consecutive route tokens must differ".to_string(),
        ));
    }
    for address in &route.address_route {
        validate_address(address)?;
    }
    validate_tolerance(&route.tolerance)?;
    Ok(())
}

/// Per-hop amounts with the tolerance distributed over the hops.
///
/// Fixed input: hop `i` guarantees at least
/// `est - est * (N - i) * tol / N` of its output token.
/// Fixed output: hop `i` asks for `est + est * (N - i - 1) * tol / N`, so
/// the final hop requests exactly the estimate.
pub fn distribute_tolerance(route: &RouteSpec) -> Result<Vec<HopSwap>, ComputeError> {
    check_route_shape(route)?;

    let hops = route.hops();
    let hop_tolerance = &route.tolerance / BigDecimal::from(hops as u64);

    let swaps = route
        .address_route
        .iter()
        .enumerate()
        .map(|(index, address)| {
            let estimate = &route.intermediary_amounts[index + 1];
            let amount = match route.swap_type {
                SwapType::FixedInput => {
                    let weight = BigDecimal::from((hops - index) as u64);
                    trunc(&(estimate - estimate * weight * &hop_tolerance))
                }
                SwapType::FixedOutput => {
                    let weight = BigDecimal::from((hops - index - 1) as u64);
                    trunc(&(estimate + estimate * weight * &hop_tolerance))
                }
            };

            HopSwap {
                pair_address: address.clone(),
                endpoint: route.swap_type.endpoint().to_string(),
                token_out: route.token_route[index + 1].clone(),
                amount,
            }
        })
        .collect();

    Ok(swaps)
}

/// Amount of the first token sent with the swap; fixed-output swaps pad it
/// with the full tolerance
pub fn amount_in_with_tolerance(route: &RouteSpec) -> BigDecimal {
    let estimate = &route.intermediary_amounts[0];
    match route.swap_type {
        SwapType::FixedInput => estimate.clone(),
        SwapType::FixedOutput => trunc(&(estimate + estimate * &route.tolerance)),
    }
}

pub fn gas_limit(hops: usize) -> u64 {
    hops as u64 * MULTI_PAIR_SWAP_GAS_MULTIPLIER
}

/// Arguments for the router's multi-pair swap
pub fn build_multi_pair_swap(route: &RouteSpec) -> Result<MultiPairSwap, ComputeError> {
    let swaps = distribute_tolerance(route)?;
    Ok(MultiPairSwap {
        token_in: route.token_route[0].clone(),
        amount_in: amount_in_with_tolerance(route),
        swaps,
        gas_limit: gas_limit(route.hops()),
    })
}
