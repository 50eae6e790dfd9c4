pub mod amm;
pub mod analytics;
pub mod farm;
pub mod governance;
pub mod pair;
pub mod price_discovery;
pub mod route;
pub mod router;
pub mod simple_lock;
pub mod token;
pub mod usd;
pub mod week;

use crate::blockchain::client::LedgerError;
use crate::db::TimeSeriesError;
use crate::providers::OracleError;
use crate::validation::ValidationError;
use thiserror::Error;

pub use amm::{amount_in, amount_out, quote};
pub use usd::compute_value_usd;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Ledger read failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Input mismatch: {0}")]
    InputMismatch(String),

    #[error("Price oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Time-series query failed: {0}")]
    TimeSeries(#[from] TimeSeriesError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
}

/// Current unix time in seconds
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
