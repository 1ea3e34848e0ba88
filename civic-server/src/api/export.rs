//! CSV export endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::{ApiError, ApiResult};
use crate::services::{export_csv, EXPORT_FILENAME};
use crate::AppState;

/// GET /api/export/csv
///
/// Completed submissions, newest first, as a CSV attachment.
pub async fn export_submissions(State(state): State<AppState>) -> ApiResult<Response> {
    let submissions = state.store.list_submissions().await?;
    let csv = export_csv(&submissions)
        .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new().route("/api/export/csv", get(export_submissions))
}
