//! Dashboard analytics endpoints

use axum::{extract::State, routing::get, Json, Router};
use civic_common::{AnalysisResult, AnalyticsSnapshot};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::compute_snapshot;
use crate::AppState;

/// GET /api/analytics
///
/// Recomputes the snapshot from all completed submissions and stores a copy.
/// A failed store is logged; the computed snapshot is still returned.
pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSnapshot>> {
    let submissions = state.store.list_submissions().await?;
    let snapshot = compute_snapshot(&submissions);

    if snapshot.total_feedback == 0 {
        return Ok(Json(snapshot));
    }

    match state.store.create_analysis(None, snapshot.clone()).await {
        Ok(stored) => debug!(analysis_id = %stored.id, total = snapshot.total_feedback, "Analytics snapshot stored"),
        Err(e) => warn!(error = %e, "Failed to store analytics snapshot"),
    }

    Ok(Json(snapshot))
}

/// GET /api/analytics/latest
pub async fn get_latest_analysis(State(state): State<AppState>) -> ApiResult<Json<AnalysisResult>> {
    state
        .store
        .latest_analysis()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No analysis results yet".to_string()))
}

/// Build analytics routes
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics", get(get_analytics))
        .route("/api/analytics/latest", get(get_latest_analysis))
}
