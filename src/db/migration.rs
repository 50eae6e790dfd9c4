use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // One row per recorded sample; values are decimal strings
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS metric_points (
            series TEXT NOT NULL,
            metric TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_metric_points_series_time
         ON metric_points(series, metric, timestamp)",
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
