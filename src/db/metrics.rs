use crate::db::{TimeBucket, TimeSeriesError, TimeSeriesStore};
use crate::models::HistoricPoint;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Time-series store on top of the SQLite pool
#[derive(Clone)]
pub struct SqliteTimeSeries {
    pool: SqlitePool,
}

impl SqliteTimeSeries {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn points_since(
        &self,
        series: &str,
        metric: &str,
        start: i64,
    ) -> Result<Vec<(i64, BigDecimal)>, TimeSeriesError> {
        let rows = sqlx::query(
            "SELECT timestamp, value FROM metric_points
             WHERE series = ? AND metric = ? AND timestamp >= ?
             ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(series)
        .bind(metric)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(i64, BigDecimal), TimeSeriesError> {
                let timestamp: i64 = row.try_get("timestamp")?;
                let raw: String = row.try_get("value")?;
                let value = parse_value(series, metric, &raw)?;
                Ok((timestamp, value))
            })
            .collect()
    }
}

fn parse_value(series: &str, metric: &str, raw: &str) -> Result<BigDecimal, TimeSeriesError> {
    BigDecimal::from_str(raw).map_err(|_| TimeSeriesError::InvalidValue {
        series: series.to_string(),
        metric: metric.to_string(),
        value: raw.to_string(),
    })
}

fn into_points(buckets: BTreeMap<i64, BigDecimal>) -> Vec<HistoricPoint> {
    buckets
        .into_iter()
        .map(|(timestamp, value)| HistoricPoint { timestamp, value })
        .collect()
}

#[async_trait]
impl TimeSeriesStore for SqliteTimeSeries {
    async fn record(
        &self,
        series: &str,
        metric: &str,
        timestamp: i64,
        value: &BigDecimal,
    ) -> Result<(), TimeSeriesError> {
        sqlx::query("INSERT INTO metric_points (series, metric, timestamp, value) VALUES (?, ?, ?, ?)")
            .bind(series)
            .bind(metric)
            .bind(timestamp)
            .bind(value.to_string())
            .execute(&self.pool)
            .await?;

        debug!("Recorded {}.{} at {}: {}", series, metric, timestamp, value);
        Ok(())
    }

    async fn query_aggregate(
        &self,
        series: &str,
        metric: &str,
        bucket: TimeBucket,
        start: i64,
    ) -> Result<Vec<HistoricPoint>, TimeSeriesError> {
        let mut buckets: BTreeMap<i64, BigDecimal> = BTreeMap::new();
        for (timestamp, value) in self.points_since(series, metric, start).await? {
            *buckets.entry(bucket.floor(timestamp)).or_default() += value;
        }
        Ok(into_points(buckets))
    }

    async fn query_closing(
        &self,
        series: &str,
        metric: &str,
        bucket: TimeBucket,
        start: i64,
    ) -> Result<Vec<HistoricPoint>, TimeSeriesError> {
        // Rows are time ordered, so the last insert per bucket wins
        let buckets: BTreeMap<i64, BigDecimal> = self
            .points_since(series, metric, start)
            .await?
            .into_iter()
            .map(|(timestamp, value)| (bucket.floor(timestamp), value))
            .collect();
        Ok(into_points(buckets))
    }

    async fn query_latest(&self, series: &str, metric: &str) -> Result<Option<BigDecimal>, TimeSeriesError> {
        let row = sqlx::query(
            "SELECT value FROM metric_points
             WHERE series = ? AND metric = ?
             ORDER BY timestamp DESC, rowid DESC
             LIMIT 1",
        )
        .bind(series)
        .bind(metric)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                Ok(Some(parse_value(series, metric, &raw)?))
            }
            None => Ok(None),
        }
    }
}
