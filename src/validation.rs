use bigdecimal::{BigDecimal, Zero};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid contract address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid epoch {epoch}: lower than first week start epoch {first_week_start_epoch}")]
    EpochBeforeFirstWeek {
        epoch: u64,
        first_week_start_epoch: u64,
    },

    #[error("Invalid week {0}: weeks start at 1")]
    InvalidWeek(i64),

    #[error("Invalid tolerance {0}: must be in [0, 1)")]
    InvalidTolerance(String),
}

/// Contract and account addresses are 32-byte public keys in hex.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let decoded = match hex::decode(address) {
        Ok(bytes) => bytes,
        Err(_) => return Err(ValidationError::InvalidAddress(address.to_string())),
    };

    if decoded.len() != 32 {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

pub fn validate_week(week: i64) -> Result<u64, ValidationError> {
    if week <= 0 {
        return Err(ValidationError::InvalidWeek(week));
    }
    Ok(week as u64)
}

pub fn validate_tolerance(tolerance: &BigDecimal) -> Result<(), ValidationError> {
    if *tolerance < BigDecimal::zero() || *tolerance >= BigDecimal::from(1) {
        return Err(ValidationError::InvalidTolerance(tolerance.to_string()));
    }
    Ok(())
}
