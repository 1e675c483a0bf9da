//! Data models for the Anilaye dashboard backend.
//!
//! Rows mirror the hosted database tables one-to-one and are the only place
//! column names appear outside `schema.rs`. Derived types (`DistributorView`,
//! `FilterStateView`) are computed fresh on every snapshot cycle and never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// One water-dispensing site. `community` doubles as the display name when no
/// explicit name exists.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct WaterPoint {
    // ---
    pub id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub community: Option<String>,
    pub capacity: f64,
    pub filter_status: Option<String>,
    pub last_maintenance: Option<DateTime<Utc>>,
}

/// One timestamped telemetry sample from a water point's IoT sensor.
///
/// `filter_status` is an optional explicit token pushed by newer firmware;
/// most readings leave it NULL and status is taken from the water point row.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct IotReading {
    // ---
    pub id: i64,
    pub point_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub volume_l: f64,
    pub turbidity: Option<f64>,
    pub battery: Option<f64>,
    pub filter_health: Option<f64>,
    pub filter_status: Option<String>,
}

/// One payment transaction, optionally tied to a water point.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Payment {
    // ---
    pub id: Uuid,
    pub water_point_id: Option<Uuid>,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// ---

/// Filter classification, ordered by the precedence the derivation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCondition {
    ToReplace,
    Failed,
    Good,
    Medium,
}

impl FilterCondition {
    pub fn label(self) -> &'static str {
        match self {
            FilterCondition::ToReplace => "To replace",
            FilterCondition::Failed => "Failed",
            FilterCondition::Good => "Good",
            FilterCondition::Medium => "Medium",
        }
    }

    pub fn severity(self) -> &'static str {
        match self {
            FilterCondition::ToReplace | FilterCondition::Failed => "critical",
            FilterCondition::Good => "nominal",
            FilterCondition::Medium => "warning",
        }
    }

    /// Badge classes the front-end applies as-is.
    pub fn class_name(self) -> &'static str {
        match self {
            FilterCondition::ToReplace | FilterCondition::Failed => "bg-red-100 text-red-600",
            FilterCondition::Good => "bg-green-100 text-green-600",
            FilterCondition::Medium => "bg-yellow-100 text-yellow-600",
        }
    }

    pub fn to_view(self) -> FilterStateView {
        FilterStateView {
            label: self.label(),
            class_name: self.class_name(),
            severity: self.severity(),
        }
    }
}

/// Display form of a [`FilterCondition`], shaped for the badge component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterStateView {
    pub label: &'static str,
    #[serde(rename = "className")]
    pub class_name: &'static str,
    pub severity: &'static str,
}

/// Enriched water point as served to tables, maps and KPI cards.
///
/// Recomputed on every snapshot cycle from a `WaterPoint` and its latest
/// reading; `active` and `filter_state` are derived, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct DistributorView {
    // ---
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: f64,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub volume: f64,
    pub volume_percent: f64,
    pub turbidity: Option<f64>,
    pub battery: Option<f64>,
    pub filter_health: Option<f64>,
    pub active: bool,
    #[serde(rename = "filterState")]
    pub filter_state: FilterStateView,
}

impl DistributorView {
    /// Case-insensitive match against name, location and short code, used by
    /// the list endpoint's search parameter.
    pub fn matches_search(&self, term: &str) -> bool {
        // ---
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self
                .location
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(&term))
            || self.code.to_lowercase().contains(&term)
    }
}

/// Short display identifier: `D-` plus the first 8 hex digits of the id.
pub fn display_code(id: Uuid) -> String {
    // ---
    let hex = id.simple().to_string();
    format!("D-{}", &hex[..8])
}
