//! Database migrations
//!
//! Migrations are handled by SQLx and stored in the `migrations/` directory.
//! This module runs them and reports on the resulting schema.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Tables the application cannot run without
pub const REQUIRED_TABLES: &[&str] = &[
    "users",
    "complaints",
    "tags",
    "complaint_tags",
    "comments",
    "audit_logs",
];

/// Apply all embedded migrations that have not run yet
pub async fn run(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

/// Names of required tables absent from the connected database
pub async fn missing_tables(pool: &SqlitePool) -> Result<Vec<&'static str>> {
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await
            .context("Failed to read schema")?;

    Ok(REQUIRED_TABLES
        .iter()
        .copied()
        .filter(|table| !existing.iter().any(|name| name == table))
        .collect())
}

/// Cheap connectivity probe
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database did not answer")?;
    Ok(())
}
