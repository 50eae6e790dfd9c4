use super::amm::{checked_div, pow10};
use super::ComputeError;
use bigdecimal::BigDecimal;

/// Raw integer amount to whole token units
pub fn denominate(amount: &BigDecimal, decimals: u32) -> BigDecimal {
    amount * pow10(-i64::from(decimals))
}

/// `amount × 10^-decimals × price`
pub fn compute_value_usd(amount: &BigDecimal, decimals: u32, price_usd: &BigDecimal) -> BigDecimal {
    denominate(amount, decimals) * price_usd
}

/// Express a USD figure in units of the reference stable coin
pub fn normalize_usd(value: &BigDecimal, reference_price: &BigDecimal) -> Result<BigDecimal, ComputeError> {
    checked_div(value, reference_price)
}
