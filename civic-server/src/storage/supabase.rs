//! Hosted database store over a PostgREST-compatible REST API (Supabase)
//!
//! Tables `feedback_submissions` and `analysis_results` with snake_case
//! columns. Inserts and updates ask for the written row back with
//! `Prefer: return=representation`.

use async_trait::async_trait;
use civic_common::config::HostedDatabaseConfig;
use civic_common::{
    time, AnalysisResult, AnalyticsSnapshot, Error, FeedbackSubmission, NewSubmission,
    ProcessingStatus, Result, SentimentDistribution, SentimentLabel, SubmissionUpdate,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{FeedbackStore, StorageBackend};

const SUBMISSIONS_TABLE: &str = "feedback_submissions";
const ANALYSES_TABLE: &str = "analysis_results";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Row shape of `feedback_submissions`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubmissionRow {
    id: String,
    original_text: String,
    original_language: Option<String>,
    translated_text: Option<String>,
    sentiment_score: Option<f64>,
    sentiment_label: Option<String>,
    inclusive_rewrite: Option<String>,
    demographic_tags: Option<Vec<String>>,
    processing_status: Option<String>,
    created_at: String,
}

impl TryFrom<SubmissionRow> for FeedbackSubmission {
    type Error = Error;

    fn try_from(row: SubmissionRow) -> Result<Self> {
        Ok(FeedbackSubmission {
            id: row.id,
            original_text: row.original_text,
            original_language: row.original_language,
            translated_text: row.translated_text,
            sentiment_score: row.sentiment_score,
            sentiment_label: row
                .sentiment_label
                .as_deref()
                .map(str::parse::<SentimentLabel>)
                .transpose()?,
            inclusive_rewrite: row.inclusive_rewrite,
            demographic_tags: row.demographic_tags.unwrap_or_default(),
            processing_status: row
                .processing_status
                .as_deref()
                .map(str::parse::<ProcessingStatus>)
                .transpose()?
                .unwrap_or(ProcessingStatus::Pending),
            created_at: time::parse_storage_string(&row.created_at)?,
        })
    }
}

/// Insert payload; the server assigns `id` and `created_at`
#[derive(Debug, Serialize)]
struct SubmissionInsert<'a> {
    original_text: &'a str,
    original_language: Option<&'a str>,
    demographic_tags: &'a [String],
    processing_status: &'static str,
}

/// PATCH payload; absent fields are omitted so they stay untouched
#[derive(Debug, Default, Serialize)]
struct SubmissionPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    original_language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translated_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sentiment_label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inclusive_rewrite: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    demographic_tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_status: Option<&'static str>,
}

impl<'a> From<&'a SubmissionUpdate> for SubmissionPatch<'a> {
    fn from(update: &'a SubmissionUpdate) -> Self {
        Self {
            original_language: update.original_language.as_deref(),
            translated_text: update.translated_text.as_deref(),
            sentiment_score: update.sentiment_score,
            sentiment_label: update.sentiment_label.map(|l| l.as_str()),
            inclusive_rewrite: update.inclusive_rewrite.as_deref(),
            demographic_tags: update.demographic_tags.as_deref(),
            processing_status: update.processing_status.map(|s| s.as_str()),
        }
    }
}

/// Row shape of `analysis_results`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnalysisRow {
    id: String,
    submission_id: Option<String>,
    total_feedback: Option<u32>,
    translated_count: Option<u32>,
    demographic_groups: Option<u32>,
    representation_gaps: Option<u32>,
    sentiment_distribution: Option<SentimentDistribution>,
    demographic_sentiment: Option<BTreeMap<String, SentimentDistribution>>,
    insights: Option<Vec<String>>,
    recommendations: Option<Vec<String>>,
    created_at: String,
}

impl TryFrom<AnalysisRow> for AnalysisResult {
    type Error = Error;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        Ok(AnalysisResult {
            id: row.id,
            submission_id: row.submission_id,
            snapshot: AnalyticsSnapshot {
                total_feedback: row.total_feedback.unwrap_or(0),
                translated_count: row.translated_count.unwrap_or(0),
                demographic_groups: row.demographic_groups.unwrap_or(0),
                representation_gaps: row.representation_gaps.unwrap_or(0),
                sentiment_distribution: row.sentiment_distribution.unwrap_or_default(),
                demographic_sentiment: row.demographic_sentiment.unwrap_or_default(),
                insights: row.insights.unwrap_or_default(),
                recommendations: row.recommendations.unwrap_or_default(),
            },
            created_at: time::parse_storage_string(&row.created_at)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct AnalysisInsert<'a> {
    submission_id: Option<&'a str>,
    total_feedback: u32,
    translated_count: u32,
    demographic_groups: u32,
    representation_gaps: u32,
    sentiment_distribution: &'a SentimentDistribution,
    demographic_sentiment: &'a BTreeMap<String, SentimentDistribution>,
    insights: &'a [String],
    recommendations: &'a [String],
}

pub struct SupabaseStore {
    http_client: reqwest::Client,
    rest_url: String,
}

impl SupabaseStore {
    pub fn new(config: &HostedDatabaseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.anon_key)
            .map_err(|e| Error::Config(format!("Invalid hosted database key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
            .map_err(|e| Error::Config(format!("Invalid hosted database key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rest_url: rest_base_url(&config.url),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// Send a request and decode the JSON array PostgREST answers with
    async fn send_rows<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<Vec<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Remote(format!("Hosted database request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "Hosted database returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| Error::Remote(format!("Hosted database response was not valid JSON: {}", e)))
    }
}

/// `https://x.supabase.co/` → `https://x.supabase.co/rest/v1`
fn rest_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{}/rest/v1", trimmed)
    }
}

/// PostgREST equality filter value
fn eq_filter(value: &str) -> String {
    format!("eq.{}", value)
}

fn first_row<T, U>(rows: Vec<T>) -> Result<Option<U>>
where
    U: TryFrom<T, Error = Error>,
{
    rows.into_iter().next().map(U::try_from).transpose()
}

#[async_trait]
impl FeedbackStore for SupabaseStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Hosted
    }

    async fn create_submission(&self, submission: NewSubmission) -> Result<FeedbackSubmission> {
        let payload = SubmissionInsert {
            original_text: &submission.original_text,
            original_language: submission.original_language.as_deref(),
            demographic_tags: &submission.demographic_tags,
            processing_status: ProcessingStatus::Pending.as_str(),
        };

        let rows: Vec<SubmissionRow> = self
            .send_rows(
                self.http_client
                    .post(self.table_url(SUBMISSIONS_TABLE))
                    .header("Prefer", "return=representation")
                    .json(&[payload]),
            )
            .await?;

        first_row(rows)?.ok_or_else(|| Error::Remote("Insert returned no row".to_string()))
    }

    async fn get_submission(&self, id: &str) -> Result<Option<FeedbackSubmission>> {
        let rows: Vec<SubmissionRow> = self
            .send_rows(
                self.http_client
                    .get(self.table_url(SUBMISSIONS_TABLE))
                    .query(&[("select", "*".to_string()), ("id", eq_filter(id)), ("limit", "1".to_string())]),
            )
            .await?;

        first_row(rows)
    }

    async fn update_submission(
        &self,
        id: &str,
        update: SubmissionUpdate,
    ) -> Result<Option<FeedbackSubmission>> {
        if update.is_empty() {
            return self.get_submission(id).await;
        }

        let rows: Vec<SubmissionRow> = self
            .send_rows(
                self.http_client
                    .patch(self.table_url(SUBMISSIONS_TABLE))
                    .query(&[("id", eq_filter(id))])
                    .header("Prefer", "return=representation")
                    .json(&SubmissionPatch::from(&update)),
            )
            .await?;

        first_row(rows)
    }

    async fn list_submissions(&self) -> Result<Vec<FeedbackSubmission>> {
        let rows: Vec<SubmissionRow> = self
            .send_rows(
                self.http_client
                    .get(self.table_url(SUBMISSIONS_TABLE))
                    .query(&[("select", "*"), ("order", "created_at.desc")]),
            )
            .await?;

        rows.into_iter().map(FeedbackSubmission::try_from).collect()
    }

    async fn create_analysis(
        &self,
        submission_id: Option<String>,
        snapshot: AnalyticsSnapshot,
    ) -> Result<AnalysisResult> {
        let payload = AnalysisInsert {
            submission_id: submission_id.as_deref(),
            total_feedback: snapshot.total_feedback,
            translated_count: snapshot.translated_count,
            demographic_groups: snapshot.demographic_groups,
            representation_gaps: snapshot.representation_gaps,
            sentiment_distribution: &snapshot.sentiment_distribution,
            demographic_sentiment: &snapshot.demographic_sentiment,
            insights: &snapshot.insights,
            recommendations: &snapshot.recommendations,
        };

        let rows: Vec<AnalysisRow> = self
            .send_rows(
                self.http_client
                    .post(self.table_url(ANALYSES_TABLE))
                    .header("Prefer", "return=representation")
                    .json(&[payload]),
            )
            .await?;

        first_row(rows)?.ok_or_else(|| Error::Remote("Insert returned no row".to_string()))
    }

    async fn latest_analysis(&self) -> Result<Option<AnalysisResult>> {
        let rows: Vec<AnalysisRow> = self
            .send_rows(
                self.http_client
                    .get(self.table_url(ANALYSES_TABLE))
                    .query(&[("select", "*"), ("order", "created_at.desc"), ("limit", "1")]),
            )
            .await?;

        first_row(rows)
    }

    async fn analysis_for_submission(&self, submission_id: &str) -> Result<Option<AnalysisResult>> {
        let rows: Vec<AnalysisRow> = self
            .send_rows(
                self.http_client
                    .get(self.table_url(ANALYSES_TABLE))
                    .query(&[
                        ("select", "*".to_string()),
                        ("submission_id", eq_filter(submission_id)),
                        ("limit", "1".to_string()),
                    ]),
            )
            .await?;

        first_row(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rest_base_url() {
        assert_eq!(rest_base_url("https://x.supabase.co"), "https://x.supabase.co/rest/v1");
        assert_eq!(rest_base_url("https://x.supabase.co/"), "https://x.supabase.co/rest/v1");
        assert_eq!(
            rest_base_url("https://x.supabase.co/rest/v1/"),
            "https://x.supabase.co/rest/v1"
        );
    }

    #[test]
    fn test_submission_row_conversion() {
        let row: SubmissionRow = serde_json::from_value(json!({
            "id": "9b1c",
            "original_text": "Más autobuses por favor",
            "original_language": "Spanish",
            "translated_text": "More buses please",
            "sentiment_score": 0.2,
            "sentiment_label": "positive",
            "inclusive_rewrite": null,
            "demographic_tags": ["Spanish Speaker"],
            "processing_status": "completed",
            "created_at": "2024-03-01T10:00:00.123456"
        }))
        .unwrap();

        let submission = FeedbackSubmission::try_from(row).unwrap();
        assert_eq!(submission.sentiment_label, Some(SentimentLabel::Positive));
        assert_eq!(submission.processing_status, ProcessingStatus::Completed);
        assert_eq!(submission.demographic_tags, vec!["Spanish Speaker".to_string()]);
        assert!(submission.inclusive_rewrite.is_none());
    }

    #[test]
    fn test_submission_row_defaults_for_null_columns() {
        let row: SubmissionRow = serde_json::from_value(json!({
            "id": "1",
            "original_text": "hi",
            "original_language": null,
            "translated_text": null,
            "sentiment_score": null,
            "sentiment_label": null,
            "inclusive_rewrite": null,
            "demographic_tags": null,
            "processing_status": null,
            "created_at": "2024-03-01T10:00:00+00:00"
        }))
        .unwrap();

        let submission = FeedbackSubmission::try_from(row).unwrap();
        assert!(submission.demographic_tags.is_empty());
        assert_eq!(submission.processing_status, ProcessingStatus::Pending);
    }

    #[test]
    fn test_patch_only_carries_present_fields() {
        let update = SubmissionUpdate::status(ProcessingStatus::Processing);
        let body = serde_json::to_value(SubmissionPatch::from(&update)).unwrap();
        assert_eq!(body, json!({ "processing_status": "processing" }));
    }

    #[test]
    fn test_analysis_row_conversion() {
        let row: AnalysisRow = serde_json::from_value(json!({
            "id": "a1",
            "submission_id": null,
            "total_feedback": 4,
            "translated_count": 1,
            "demographic_groups": 2,
            "representation_gaps": 1,
            "sentiment_distribution": { "positive": 50, "neutral": 25, "negative": 25 },
            "demographic_sentiment": { "Urban": { "positive": 0, "neutral": 0, "negative": 100 } },
            "insights": ["Urban communities report 100% negative sentiment"],
            "recommendations": [],
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        let result = AnalysisResult::try_from(row).unwrap();
        assert_eq!(result.snapshot.total_feedback, 4);
        assert_eq!(result.snapshot.sentiment_distribution.positive, 50);
        assert_eq!(result.snapshot.demographic_sentiment["Urban"].negative, 100);
    }

    #[test]
    fn test_invalid_key_header_is_config_error() {
        let config = HostedDatabaseConfig {
            url: "https://x.supabase.co".to_string(),
            anon_key: "bad\nkey".to_string(),
        };
        assert!(matches!(SupabaseStore::new(&config), Err(Error::Config(_))));
    }
}
