//! Feedback ingestion and lookup endpoints

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use civic_common::{FeedbackSubmission, NewSubmission};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{ApiError, ApiResult, FieldIssue};
use crate::services::parse_upload;
use crate::AppState;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Multipart field carrying the upload
const UPLOAD_FIELD: &str = "file";

/// POST /api/feedback/text request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TextFeedbackRequest {
    #[validate(required, custom = "not_blank")]
    pub original_text: Option<String>,
    pub original_language: Option<String>,
    pub demographic_tags: Option<Vec<String>>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Must not be empty".into());
        return Err(error);
    }
    Ok(())
}

impl TextFeedbackRequest {
    /// Validated request into a new record; blank optionals are dropped
    fn into_submission(self) -> NewSubmission {
        let tags = self
            .demographic_tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        NewSubmission::new(self.original_text.unwrap_or_default())
            .with_language(
                self.original_language
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty()),
            )
            .with_tags(tags)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFeedbackResponse {
    pub success: bool,
    pub submission_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub submission_ids: Vec<String>,
    pub count: usize,
    pub message: String,
}

/// `original_text` → `originalText`, matching the wire field names
fn wire_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            name.extend(c.to_uppercase());
            upper_next = false;
        } else {
            name.push(c);
        }
    }
    name
}

fn field_issues(errors: &ValidationErrors) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldIssue {
                field: wire_field_name(field),
                code: error.code.to_string(),
                message: match &error.message {
                    Some(message) => message.to_string(),
                    None if error.code == "required" => "Required".to_string(),
                    None => "Invalid value".to_string(),
                },
            })
        })
        .collect();
    issues.sort_by(|a, b| a.field.cmp(&b.field));
    issues
}

/// POST /api/feedback/text
///
/// Stores a pending submission and starts enrichment in the background.
pub async fn submit_text(
    State(state): State<AppState>,
    payload: Result<Json<TextFeedbackRequest>, JsonRejection>,
) -> ApiResult<Json<TextFeedbackResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::Validation(vec![FieldIssue {
            field: "body".to_string(),
            code: "invalid_json".to_string(),
            message: rejection.body_text(),
        }])
    })?;

    request
        .validate()
        .map_err(|errors| ApiError::Validation(field_issues(&errors)))?;

    let submission = state.store.create_submission(request.into_submission()).await?;
    info!(submission_id = %submission.id, "Text feedback received");

    state.pipeline.spawn(submission.id.clone());

    Ok(Json(TextFeedbackResponse {
        success: true,
        submission_id: submission.id,
        message: "Feedback submitted for processing".to_string(),
    }))
}

fn multipart_error(error: axum::extract::multipart::MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        ApiError::BadRequest(error.body_text())
    }
}

/// POST /api/feedback/upload
///
/// Accepts a CSV or TXT file in the `file` field; one submission per row.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    if bytes.len() > state.max_upload_bytes {
        warn!(filename = %filename, size = bytes.len(), limit = state.max_upload_bytes, "Upload rejected, too large");
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds the {} byte upload limit",
            state.max_upload_bytes
        )));
    }

    let rows = parse_upload(&filename, &bytes).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut submission_ids = Vec::with_capacity(rows.len());
    for row in rows {
        let submission = NewSubmission::new(row.feedback)
            .with_language(row.language)
            .with_tags(row.demographic.into_iter().collect());
        let created = state.store.create_submission(submission).await?;
        state.pipeline.spawn(created.id.clone());
        submission_ids.push(created.id);
    }

    let count = submission_ids.len();
    info!(filename = %filename, count, "File upload accepted");

    Ok(Json(UploadResponse {
        success: true,
        submission_ids,
        count,
        message: format!("{} feedback items submitted for processing", count),
    }))
}

/// GET /api/feedback/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FeedbackSubmission>> {
    state
        .store
        .get_submission(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))
}

/// GET /api/feedback
///
/// All submissions, newest first.
pub async fn list_submissions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FeedbackSubmission>>> {
    Ok(Json(state.store.list_submissions().await?))
}

/// Build feedback routes; the upload route accepts bodies up to the ceiling
pub fn feedback_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/feedback/text", post(submit_text))
        .route(
            "/api/feedback/upload",
            post(upload_file).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/api/feedback/:id", get(get_submission))
        .route("/api/feedback", get(list_submissions))
}
