use crate::db::migration::run_migrations;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};
use tracing::info;

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    // Create database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating time-series database at {}", database_url);
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePool::connect(database_url).await?;

    // Ingestion workers write while readers aggregate
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}
