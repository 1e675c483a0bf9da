//! Status derivation for water points.
//!
//! This is the one piece of real logic in the service: merging a water point
//! with its most recent telemetry sample into a [`DistributorView`] with a
//! computed `active` flag and filter classification. Every function here is
//! pure and total — empty inputs, missing readings and malformed numbers all
//! produce a well-formed view, never a panic.
//!
//! Derivation rules:
//! - status token = water point `filter_status`, else the reading's, else
//!   empty; trimmed and lowercased before comparison
//! - inactive when status is replace/replaced/failed, or filter health < 30,
//!   or battery < 5; a point with no telemetry at all stays active
//! - filter classification precedence (first match wins): replace/replaced or
//!   health < 30 → ToReplace; failed → Failed; ok or health ≥ 80 → Good;
//!   everything else → Medium

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{display_code, DistributorView, FilterCondition, IotReading, WaterPoint};

// ---

/// Statuses that take a distributor out of service on their own.
const BLOCKING_STATUSES: [&str; 3] = ["replace", "replaced", "failed"];

/// Filter health below this is due for replacement.
const HEALTH_REPLACE_THRESHOLD: f64 = 30.0;

/// Filter health at or above this counts as good.
const HEALTH_GOOD_THRESHOLD: f64 = 80.0;

/// Battery below this percentage cannot run the dispenser.
const BATTERY_MIN_PERCENT: f64 = 5.0;

// ---

/// Drop sensor values that failed numeric coercion upstream (NaN, ±inf).
/// Comparisons against the result are then ordinary `Option` logic: absent
/// never satisfies a threshold and never panics.
pub fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Normalized filter-status token: the water point's own column wins, the
/// reading's explicit token is the fallback, absence is the empty string.
pub fn normalize_status(point: &WaterPoint, reading: Option<&IotReading>) -> String {
    // ---
    point
        .filter_status
        .as_deref()
        .or_else(|| reading.and_then(|r| r.filter_status.as_deref()))
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Volume as a percentage of capacity, clamped to [0, 100].
///
/// A non-positive capacity yields 0 rather than dividing by zero.
pub fn volume_percent(volume: f64, capacity: f64) -> f64 {
    // ---
    if capacity <= 0.0 {
        return 0.0;
    }
    (volume / capacity * 100.0).clamp(0.0, 100.0)
}

fn is_blocking_status(status: &str) -> bool {
    BLOCKING_STATUSES.contains(&status)
}

fn below(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

fn at_least(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v >= threshold)
}

/// Active/inactive determination. All three checks are false when their
/// operand is absent, so missing telemetry leaves a point active.
pub fn is_active(status: &str, filter_health: Option<f64>, battery: Option<f64>) -> bool {
    // ---
    let inactive = is_blocking_status(status)
        || below(filter_health, HEALTH_REPLACE_THRESHOLD)
        || below(battery, BATTERY_MIN_PERCENT);
    !inactive
}

/// Filter classification for display. Computed independently from the active
/// flag; note there is no battery clause here.
pub fn classify_filter(status: &str, filter_health: Option<f64>) -> FilterCondition {
    // ---
    if status == "replace" || status == "replaced" || below(filter_health, HEALTH_REPLACE_THRESHOLD)
    {
        return FilterCondition::ToReplace;
    }
    if status == "failed" {
        return FilterCondition::Failed;
    }
    if status == "ok" || at_least(filter_health, HEALTH_GOOD_THRESHOLD) {
        return FilterCondition::Good;
    }
    FilterCondition::Medium
}

// ---

/// Merge one water point with its latest reading (possibly absent) into the
/// view the presentation layer consumes.
pub fn derive_view(point: &WaterPoint, reading: Option<&IotReading>) -> DistributorView {
    // ---
    let status = normalize_status(point, reading);
    let filter_health = sanitize(reading.and_then(|r| r.filter_health));
    let battery = sanitize(reading.and_then(|r| r.battery));
    let turbidity = sanitize(reading.and_then(|r| r.turbidity));
    let volume = sanitize(reading.map(|r| r.volume_l)).unwrap_or(0.0);

    let code = display_code(point.id);
    let name = point
        .community
        .clone()
        .unwrap_or_else(|| format!("Distributeur {code}"));

    DistributorView {
        id: point.id,
        name,
        location: point.community.clone(),
        latitude: point.latitude,
        longitude: point.longitude,
        capacity: point.capacity,
        last_maintenance: point.last_maintenance,
        volume,
        volume_percent: volume_percent(volume, point.capacity),
        turbidity,
        battery,
        filter_health,
        active: is_active(&status, filter_health, battery),
        filter_state: classify_filter(&status, filter_health).to_view(),
        code,
    }
}

/// Pick the latest reading per point: maximum `created_at`, ties broken by
/// the higher reading id so repeated runs select the same row.
pub fn latest_readings(readings: &[IotReading]) -> HashMap<Uuid, &IotReading> {
    // ---
    let mut latest: HashMap<Uuid, &IotReading> = HashMap::new();
    for reading in readings {
        latest
            .entry(reading.point_id)
            .and_modify(|current| {
                if (reading.created_at, reading.id) > (current.created_at, current.id) {
                    *current = reading;
                }
            })
            .or_insert(reading);
    }
    latest
}

/// Derive views for a whole fetch cycle. Input order of `points` is kept.
pub fn enrich_all(points: &[WaterPoint], readings: &[IotReading]) -> Vec<DistributorView> {
    // ---
    let latest = latest_readings(readings);
    points
        .iter()
        .map(|point| derive_view(point, latest.get(&point.id).copied()))
        .collect()
}
