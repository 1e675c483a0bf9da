//! Distributor list and detail endpoints.
//!
//! Serves the enriched views the tables and the map render. Filtering is
//! in-memory over the current snapshot: the fleet is tens to low hundreds of
//! rows, so a fetch cycle plus an iterator pass beats a bespoke query per
//! filter combination.

use axum::{
    extract::Path, extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    routing::get, Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::models::DistributorView;
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/distributors", get(list_handler))
        .route("/api/distributors/{id}", get(detail_handler))
}

/// Query parameters for filtering the distributor list.
#[derive(Debug, Deserialize)]
pub struct DistributorQuery {
    /// Case-insensitive match on name, location or short code.
    q: Option<String>,
    #[serde(default)]
    status: StatusFilter,
    limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    fn accepts(self, view: &DistributorView) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => view.active,
            StatusFilter::Inactive => !view.active,
        }
    }
}

async fn list_handler(
    Query(params): Query<DistributorQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/distributors - {:?}", params);

    let snapshot =
        store::snapshot_for_request(&state.snapshots, &state.pool, state.config.snapshot_ttl_secs)
            .await;

    let views = apply_filters(&snapshot.distributors, &params);
    info!("Returning {} distributors", views.len());
    (StatusCode::OK, Json(views)).into_response()
}

async fn detail_handler(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let snapshot =
        store::snapshot_for_request(&state.snapshots, &state.pool, state.config.snapshot_ttl_secs)
            .await;

    match snapshot.distributors.iter().find(|d| d.id == id) {
        Some(view) => (StatusCode::OK, Json(view.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "unknown distributor", "id": id })),
        )
            .into_response(),
    }
}

/// Apply search/status/limit filters to the derived views.
fn apply_filters<'a>(
    views: &'a [DistributorView],
    params: &DistributorQuery,
) -> Vec<&'a DistributorView> {
    // ---
    views
        .iter()
        .filter(|v| params.status.accepts(v))
        .filter(|v| {
            params
                .q
                .as_deref()
                .filter(|term| !term.trim().is_empty())
                .map_or(true, |term| v.matches_search(term.trim()))
        })
        .take(params.limit.unwrap_or(1000) as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::enrich::derive_view;
    use crate::models::WaterPoint;

    fn view(id: u128, community: &str, active: bool) -> DistributorView {
        // ---
        let point = WaterPoint {
            id: Uuid::from_u128(id),
            latitude: None,
            longitude: None,
            community: Some(community.to_string()),
            capacity: 100.0,
            // a failed filter is the simplest way to force inactive
            filter_status: (!active).then(|| "FAILED".to_string()),
            last_maintenance: None,
        };
        derive_view(&point, None)
    }

    fn query(q: Option<&str>, status: StatusFilter, limit: Option<u32>) -> DistributorQuery {
        DistributorQuery {
            q: q.map(String::from),
            status,
            limit,
        }
    }

    #[test]
    fn test_status_filter() {
        // ---
        let views = vec![view(1, "Thies", true), view(2, "Fatick", false)];

        let active = apply_filters(&views, &query(None, StatusFilter::Active, None));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Thies");

        let inactive = apply_filters(&views, &query(None, StatusFilter::Inactive, None));
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name, "Fatick");

        let all = apply_filters(&views, &query(None, StatusFilter::All, None));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_search_matches_name_and_code() {
        // ---
        let views = vec![view(0xabc0_0000_0000_0000_0000_0000_0000_0001, "Thies", true)];

        assert_eq!(apply_filters(&views, &query(Some("thi"), StatusFilter::All, None)).len(), 1);
        assert_eq!(apply_filters(&views, &query(Some("d-"), StatusFilter::All, None)).len(), 1);
        assert_eq!(apply_filters(&views, &query(Some("dakar"), StatusFilter::All, None)).len(), 0);
        // blank search terms are ignored
        assert_eq!(apply_filters(&views, &query(Some("  "), StatusFilter::All, None)).len(), 1);
    }

    #[test]
    fn test_limit_caps_results() {
        // ---
        let views: Vec<DistributorView> =
            (1..=10).map(|i| view(i, &format!("Site {i}"), true)).collect();
        let limited = apply_filters(&views, &query(None, StatusFilter::All, Some(3)));
        assert_eq!(limited.len(), 3);
    }
}
