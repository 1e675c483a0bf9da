//! Read queries against the hosted database.
//!
//! This is the only I/O in the crate. The three collections are loaded
//! concurrently, and each query degrades to an empty list on failure so the
//! derivation and aggregation code downstream never sees an error — the
//! dashboard shows best-available data and the failure lands in the log.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::enrich::enrich_all;
use crate::models::{IotReading, Payment, WaterPoint};
use crate::state::{Snapshot, SnapshotStore};

// ---

pub async fn load_water_points(pool: &PgPool) -> Vec<WaterPoint> {
    // ---
    let result = sqlx::query_as::<_, WaterPoint>(
        r#"
        SELECT id, latitude, longitude, community, capacity, filter_status, last_maintenance
        FROM water_points
        ORDER BY community NULLS LAST, id
        "#,
    )
    .fetch_all(pool)
    .await;

    match result {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to fetch water_points: {e}");
            Vec::new()
        }
    }
}

pub async fn load_iot_readings(pool: &PgPool) -> Vec<IotReading> {
    // ---
    let result = sqlx::query_as::<_, IotReading>(
        r#"
        SELECT id, point_id, created_at, volume_l, turbidity, battery, filter_health, filter_status
        FROM iot_readings
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await;

    match result {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to fetch iot_readings: {e}");
            Vec::new()
        }
    }
}

pub async fn load_payments(pool: &PgPool) -> Vec<Payment> {
    // ---
    let result = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, water_point_id, amount, status, created_at
        FROM payments
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await;

    match result {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to fetch payments: {e}");
            Vec::new()
        }
    }
}

// ---

/// Run one full fetch cycle: load the three collections concurrently, derive
/// the distributor views once all three settle, and publish under the
/// generation taken when the cycle started. Returns whichever snapshot is
/// current after publication (the fresher one, if this cycle lost the race).
pub async fn refresh_snapshot(store: &SnapshotStore, pool: &PgPool) -> Arc<Snapshot> {
    // ---
    let generation = store.begin();

    let (points, readings, payments) = tokio::join!(
        load_water_points(pool),
        load_iot_readings(pool),
        load_payments(pool),
    );

    debug!(
        generation,
        points = points.len(),
        readings = readings.len(),
        payments = payments.len(),
        "Fetch cycle complete"
    );

    let distributors = enrich_all(&points, &readings);

    store
        .publish(
            generation,
            Snapshot {
                distributors,
                readings,
                payments,
                refreshed_at: Utc::now(),
            },
        )
        .await
}

/// Snapshot to serve a request from: the current one if it is younger than
/// `ttl_secs`, otherwise the result of a fresh cycle.
pub async fn snapshot_for_request(
    store: &SnapshotStore,
    pool: &PgPool,
    ttl_secs: u32,
) -> Arc<Snapshot> {
    // ---
    if let Some(snapshot) = store.fresh_within(ttl_secs).await {
        return snapshot;
    }
    refresh_snapshot(store, pool).await
}
