//! Database schema management for `anilaye`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `water_points`, `iot_readings` and `payments` tables the
/// dashboard reads from. Safe to call on every startup; no-op if objects
/// already exist. On a hosted instance these tables are usually provisioned
/// already and this only fills gaps on a fresh local database.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Static site metadata; `community` doubles as the display name
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS water_points (
            id               UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            latitude         DOUBLE PRECISION,
            longitude        DOUBLE PRECISION,
            community        TEXT,
            capacity         DOUBLE PRECISION NOT NULL DEFAULT 100,
            filter_status    TEXT,
            last_maintenance TIMESTAMPTZ
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Telemetry samples pushed by the dispenser firmware
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS iot_readings (
            id            BIGSERIAL PRIMARY KEY,
            point_id      UUID        NOT NULL REFERENCES water_points (id),
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
            volume_l      DOUBLE PRECISION NOT NULL DEFAULT 0,
            turbidity     DOUBLE PRECISION,
            battery       DOUBLE PRECISION,
            filter_health DOUBLE PRECISION,
            filter_status TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Transactions recorded by the payment provider
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id             UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            water_point_id UUID REFERENCES water_points (id),
            amount         DOUBLE PRECISION NOT NULL,
            status         TEXT        NOT NULL,
            created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for the snapshot queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_iot_readings_point_id
            ON iot_readings (point_id, created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_payments_created_at
            ON payments (created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
