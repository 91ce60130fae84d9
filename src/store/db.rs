//! Database connection management

use anyhow::{Context, Result};
use log::debug;
use sqlx::SqlitePool;

use crate::queue::QueueError;

/// Connect to the queue database.
///
/// A malformed or non-sqlite URL is a configuration error, fatal to
/// construction; nothing downstream ever sees a half-configured store.
pub async fn connect(database_url: &str) -> Result<SqlitePool, QueueError> {
    if database_url.trim().is_empty() {
        return Err(QueueError::ConnectionConfig(
            "database_url is empty".to_string(),
        ));
    }
    if !database_url.starts_with("sqlite:") {
        return Err(QueueError::ConnectionConfig(format!(
            "unsupported database_url '{database_url}' (expected sqlite:...)"
        )));
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .map_err(|err| QueueError::ConnectionConfig(format!("{database_url}: {err}")))?;

    configure(&pool)
        .await
        .map_err(|err| QueueError::ConnectionConfig(err.to_string()))?;

    debug!("connected to queue database: {database_url}");
    Ok(pool)
}

/// In-memory database for tests.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .context("Failed to connect to in-memory database")?;
    configure(&pool).await?;
    Ok(pool)
}

async fn configure(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await
        .context("Failed to enable WAL mode")?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(pool)
        .await
        .context("Failed to set synchronous mode")?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(())
}
