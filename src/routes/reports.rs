//! Activity report endpoint.
//!
//! One call returns the KPI summary cards plus the per-distributor
//! performance table for the selected reporting period.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::report::{performance_rows, summarize, PerformanceRow, ReportPeriod, ReportSummary};
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/reports", get(handler))
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    #[serde(default)]
    period: ReportPeriod,
}

#[derive(Serialize)]
struct ReportResponse {
    summary: ReportSummary,
    performance: Vec<PerformanceRow>,
    refreshed_at: DateTime<Utc>,
}

async fn handler(
    Query(params): Query<ReportQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/reports - period {:?}", params.period);

    let snapshot =
        store::snapshot_for_request(&state.snapshots, &state.pool, state.config.snapshot_ttl_secs)
            .await;

    // Calendar boundaries follow the server's local calendar, which is the
    // calendar the administrator reads the report in.
    let now = Local::now();

    let summary = summarize(
        &snapshot.distributors,
        &snapshot.readings,
        &snapshot.payments,
        params.period,
        now,
    );
    let performance = performance_rows(
        &snapshot.distributors,
        &snapshot.readings,
        &snapshot.payments,
        params.period,
        now,
    );

    (
        StatusCode::OK,
        Json(ReportResponse {
            summary,
            performance,
            refreshed_at: snapshot.refreshed_at,
        }),
    )
        .into_response()
}
