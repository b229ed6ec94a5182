//! Database connection for SQLite repository stores

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

/// Connect to an existing repository database
///
/// The file must already exist; a repository is never created on the fly.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!("Database file not found: {}", db_path.display());
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(false)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // One connection: every write goes through in order
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", db_path.display()))?;

    sqlx::query("PRAGMA synchronous = FULL")
        .execute(&pool)
        .await
        .context("Failed to set synchronous mode")?;

    log::debug!("Connected to SQLite database: {}", db_path.display());
    Ok(pool)
}

/// Check that the record table is present
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'eprint'",
    )
    .fetch_one(pool)
    .await
    .context("Failed to inspect database schema")?;

    if tables == 0 {
        anyhow::bail!("Database has no 'eprint' table");
    }
    Ok(())
}
