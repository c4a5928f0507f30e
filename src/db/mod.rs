// src/db/mod.rs
// SQLite pool construction

pub mod migration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Open the pool for `url` and bring the schema up to date.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    migration::run_migrations(&pool).await?;
    info!("Database ready at {}", url);
    Ok(pool)
}

/// Single-connection in-memory database. Each connection to `:memory:` is its
/// own database, so the pool must never open a second one or drop the first.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migration::run_migrations(&pool).await?;
    Ok(pool)
}
