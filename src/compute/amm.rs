//! Constant-product AMM math on raw integer token amounts
//!
//! All results are truncated to integers, matching what the pair contracts
//! compute on chain. Fee percents use the contract unit where 100 000 is 100%.

use super::ComputeError;
use bigdecimal::{BigDecimal, Zero};

pub const MAX_PERCENTAGE: u64 = 100_000;

/// Drop the fractional part, rounding toward zero
pub fn trunc(value: &BigDecimal) -> BigDecimal {
    value.with_scale(0)
}

/// `10^exponent`; negative exponents give the matching fraction
pub fn pow10(exponent: i64) -> BigDecimal {
    let magnitude = (0..exponent.unsigned_abs()).fold(BigDecimal::from(1), |acc, _| acc * BigDecimal::from(10));
    if exponent < 0 {
        BigDecimal::from(1) / magnitude
    } else {
        magnitude
    }
}

pub fn checked_div(numerator: &BigDecimal, denominator: &BigDecimal) -> Result<BigDecimal, ComputeError> {
    if denominator.is_zero() {
        return Err(ComputeError::Arithmetic(format!("division of {} by zero", numerator)));
    }
    Ok(numerator / denominator)
}

/// Fee percent in contract units as a fraction, e.g. 300 -> 0.003
pub fn fee_fraction(fee_percent: u64) -> BigDecimal {
    BigDecimal::from(fee_percent) / BigDecimal::from(MAX_PERCENTAGE)
}

/// Spot-price estimate: `amount * reserve_out / reserve_in`, truncated
pub fn quote(amount: &BigDecimal, reserve_in: &BigDecimal, reserve_out: &BigDecimal) -> Result<BigDecimal, ComputeError> {
    if amount.is_zero() {
        return Ok(BigDecimal::zero());
    }
    if reserve_in.is_zero() {
        return Err(ComputeError::Arithmetic("quote against an empty reserve".to_string()));
    }
    Ok(trunc(&(amount * reserve_out / reserve_in)))
}

/// Output of a fixed-input swap after the pair fee
pub fn amount_out(
    amount_in: &BigDecimal,
    reserve_in: &BigDecimal,
    reserve_out: &BigDecimal,
    fee_percent: u64,
) -> Result<BigDecimal, ComputeError> {
    if fee_percent > MAX_PERCENTAGE {
        return Err(ComputeError::Arithmetic(format!("fee percent {} out of range", fee_percent)));
    }
    let amount_in_with_fee = amount_in * BigDecimal::from(MAX_PERCENTAGE - fee_percent);
    let numerator = &amount_in_with_fee * reserve_out;
    let denominator = reserve_in * BigDecimal::from(MAX_PERCENTAGE) + amount_in_with_fee;
    Ok(trunc(&checked_div(&numerator, &denominator)?))
}

/// Input needed for a fixed-output swap after the pair fee, rounded up by one unit
pub fn amount_in(
    amount_out: &BigDecimal,
    reserve_in: &BigDecimal,
    reserve_out: &BigDecimal,
    fee_percent: u64,
) -> Result<BigDecimal, ComputeError> {
    if fee_percent >= MAX_PERCENTAGE {
        return Err(ComputeError::Arithmetic(format!("fee percent {} out of range", fee_percent)));
    }
    if amount_out >= reserve_out {
        return Err(ComputeError::Arithmetic(format!(
            "requested {} but only {} in reserve",
            amount_out, reserve_out
        )));
    }
    let numerator = reserve_in * amount_out * BigDecimal::from(MAX_PERCENTAGE);
    let denominator = (reserve_out - amount_out) * BigDecimal::from(MAX_PERCENTAGE - fee_percent);
    Ok(trunc(&checked_div(&numerator, &denominator)?) + BigDecimal::from(1))
}
