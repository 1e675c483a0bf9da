//! Transactions endpoint.
//!
//! Serves payment rows joined to distributor names, newest first, together
//! with the header totals the transactions page shows. Status and period
//! filters apply to the row list only; totals always cover the full payment
//! history so the header does not jump around as filters change.

use std::collections::HashMap;

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::models::Payment;
use crate::report::{is_completed, payment_totals, PaymentTotals, ReportPeriod};
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/payments", get(handler))
}

#[derive(Debug, Deserialize)]
struct PaymentsQuery {
    /// Exact status match, case-insensitive. Absent means all statuses.
    status: Option<String>,
    period: Option<ReportPeriod>,
    limit: Option<u32>,
}

/// One payment row as rendered by the transactions table.
#[derive(Serialize)]
struct TransactionView {
    // ---
    id: Uuid,
    distributor: Option<String>,
    amount: f64,
    status: String,
    completed: bool,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct PaymentsResponse {
    totals: PaymentTotals,
    transactions: Vec<TransactionView>,
}

async fn handler(
    Query(params): Query<PaymentsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/payments - {:?}", params);

    let snapshot =
        store::snapshot_for_request(&state.snapshots, &state.pool, state.config.snapshot_ttl_secs)
            .await;

    let names: HashMap<Uuid, &str> = snapshot
        .distributors
        .iter()
        .map(|d| (d.id, d.name.as_str()))
        .collect();

    let now = Local::now();
    let totals = payment_totals(&snapshot.payments, now);

    let transactions: Vec<TransactionView> = snapshot
        .payments
        .iter()
        .filter(|p| matches_status(p, params.status.as_deref()))
        .filter(|p| {
            params
                .period
                .map_or(true, |period| period.contains(p.created_at, now))
        })
        .take(params.limit.unwrap_or(1000) as usize)
        .map(|p| TransactionView {
            id: p.id,
            distributor: p
                .water_point_id
                .and_then(|id| names.get(&id))
                .map(|name| name.to_string()),
            amount: p.amount,
            status: p.status.clone(),
            completed: is_completed(&p.status),
            created_at: p.created_at,
        })
        .collect();

    (
        StatusCode::OK,
        Json(PaymentsResponse {
            totals,
            transactions,
        }),
    )
        .into_response()
}

fn matches_status(payment: &Payment, wanted: Option<&str>) -> bool {
    // ---
    match wanted {
        None => true,
        Some(w) if w.eq_ignore_ascii_case("all") => true,
        Some(w) => payment.status.eq_ignore_ascii_case(w),
    }
}
