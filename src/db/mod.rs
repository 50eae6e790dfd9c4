pub mod connection;
pub mod metrics;
pub mod migration;

use crate::models::HistoricPoint;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;

pub use metrics::SqliteTimeSeries;

#[derive(Error, Debug)]
pub enum TimeSeriesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored value for {series}.{metric}: {value}")]
    InvalidValue {
        series: String,
        metric: String,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Minute,
    Hour,
    Day,
}

impl TimeBucket {
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }

    /// Start of the bucket containing `timestamp`
    pub fn floor(&self, timestamp: i64) -> i64 {
        timestamp - timestamp.rem_euclid(self.seconds())
    }
}

/// Metric history keyed by series (a pair or token id) and metric name
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    async fn record(
        &self,
        series: &str,
        metric: &str,
        timestamp: i64,
        value: &BigDecimal,
    ) -> Result<(), TimeSeriesError>;

    /// Per-bucket sums from `start` onward, ordered by time
    async fn query_aggregate(
        &self,
        series: &str,
        metric: &str,
        bucket: TimeBucket,
        start: i64,
    ) -> Result<Vec<HistoricPoint>, TimeSeriesError>;

    /// Last value of each bucket from `start` onward, ordered by time
    async fn query_closing(
        &self,
        series: &str,
        metric: &str,
        bucket: TimeBucket,
        start: i64,
    ) -> Result<Vec<HistoricPoint>, TimeSeriesError>;

    async fn query_latest(&self, series: &str, metric: &str) -> Result<Option<BigDecimal>, TimeSeriesError>;
}
