//! Database schema management for `energy-dashboard`.
//!
//! Ensures required tables, indexes and seed accounts exist before serving
//! requests. Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::SqlitePool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `daily_consumption` table holding one row per device and day,
/// and the `users` table backing the login form. Safe to call on every
/// startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Written by the accumulator, read by rankings and reports
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_consumption (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id    TEXT NOT NULL,
            day          TEXT NOT NULL,
            energy_start REAL NOT NULL,
            energy_end   REAL NOT NULL,
            consumption  REAL NOT NULL,
            UNIQUE (device_id, day)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Monthly aggregates filter on substr(day, 1, 7)
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_daily_consumption_day
            ON daily_consumption (day);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            profile  TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (username, password, profile)
        VALUES
            ('admin',    'admin123',    'admin'),
            ('operator', 'operator123', 'operator'),
            ('reader',   'reader123',   'readonly');
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
