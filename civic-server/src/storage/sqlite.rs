//! SQL store over a SQLite connection pool
//!
//! List-valued and map-valued columns are stored as JSON TEXT; timestamps as
//! fixed-width RFC 3339 so `ORDER BY created_at` is chronological.

use async_trait::async_trait;
use civic_common::{
    time, AnalysisResult, AnalyticsSnapshot, Error, FeedbackSubmission, NewSubmission, Result,
    SubmissionUpdate,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use super::{new_record_id, FeedbackStore, StorageBackend};

const SUBMISSION_COLUMNS: &str = "id, original_text, original_language, translated_text, \
     sentiment_score, sentiment_label, inclusive_rewrite, demographic_tags, \
     processing_status, created_at";

const ANALYSIS_COLUMNS: &str = "id, submission_id, total_feedback, translated_count, \
     demographic_groups, representation_gaps, sentiment_distribution, \
     demographic_sentiment, insights, recommendations, created_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create tables if they don't exist.
    ///
    /// In-memory URLs are pinned to a single long-lived connection, since
    /// every SQLite connection to `:memory:` opens a separate database.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?;

        let pool = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating tables if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        init_tables(&pool).await?;
        Ok(Self { pool })
    }
}

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback_submissions (
            id TEXT PRIMARY KEY,
            original_text TEXT NOT NULL,
            original_language TEXT,
            translated_text TEXT,
            sentiment_score REAL,
            sentiment_label TEXT,
            inclusive_rewrite TEXT,
            demographic_tags TEXT NOT NULL DEFAULT '[]',
            processing_status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_results (
            id TEXT PRIMARY KEY,
            submission_id TEXT REFERENCES feedback_submissions(id),
            total_feedback INTEGER NOT NULL DEFAULT 0,
            translated_count INTEGER NOT NULL DEFAULT 0,
            demographic_groups INTEGER NOT NULL DEFAULT 0,
            representation_gaps INTEGER NOT NULL DEFAULT 0,
            sentiment_distribution TEXT NOT NULL,
            demographic_sentiment TEXT NOT NULL DEFAULT '{}',
            insights TEXT NOT NULL DEFAULT '[]',
            recommendations TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (feedback_submissions, analysis_results)");

    Ok(())
}

fn submission_from_row(row: &SqliteRow) -> Result<FeedbackSubmission> {
    let label: Option<String> = row.try_get("sentiment_label")?;
    let tags: String = row.try_get("demographic_tags")?;
    let status: String = row.try_get("processing_status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(FeedbackSubmission {
        id: row.try_get("id")?,
        original_text: row.try_get("original_text")?,
        original_language: row.try_get("original_language")?,
        translated_text: row.try_get("translated_text")?,
        sentiment_score: row.try_get("sentiment_score")?,
        sentiment_label: label.map(|l| l.parse()).transpose()?,
        inclusive_rewrite: row.try_get("inclusive_rewrite")?,
        demographic_tags: serde_json::from_str(&tags)?,
        processing_status: status.parse()?,
        created_at: time::parse_storage_string(&created_at)?,
    })
}

fn analysis_from_row(row: &SqliteRow) -> Result<AnalysisResult> {
    let distribution: String = row.try_get("sentiment_distribution")?;
    let per_group: String = row.try_get("demographic_sentiment")?;
    let insights: String = row.try_get("insights")?;
    let recommendations: String = row.try_get("recommendations")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(AnalysisResult {
        id: row.try_get("id")?,
        submission_id: row.try_get("submission_id")?,
        snapshot: AnalyticsSnapshot {
            total_feedback: count_column(row, "total_feedback")?,
            translated_count: count_column(row, "translated_count")?,
            demographic_groups: count_column(row, "demographic_groups")?,
            representation_gaps: count_column(row, "representation_gaps")?,
            sentiment_distribution: serde_json::from_str(&distribution)?,
            demographic_sentiment: serde_json::from_str(&per_group)?,
            insights: serde_json::from_str(&insights)?,
            recommendations: serde_json::from_str(&recommendations)?,
        },
        created_at: time::parse_storage_string(&created_at)?,
    })
}

fn count_column(row: &SqliteRow, column: &str) -> Result<u32> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value)
        .map_err(|_| Error::Internal(format!("Column {} out of range: {}", column, value)))
}

#[async_trait]
impl FeedbackStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sql
    }

    async fn create_submission(&self, submission: NewSubmission) -> Result<FeedbackSubmission> {
        let record = FeedbackSubmission::new(new_record_id(), submission, time::now());
        let tags = serde_json::to_string(&record.demographic_tags)?;

        sqlx::query(
            r#"
            INSERT INTO feedback_submissions (
                id, original_text, original_language, demographic_tags,
                processing_status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.original_text)
        .bind(&record.original_language)
        .bind(&tags)
        .bind(record.processing_status.as_str())
        .bind(time::to_storage_string(&record.created_at))
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_submission(&self, id: &str) -> Result<Option<FeedbackSubmission>> {
        let query = format!("SELECT {} FROM feedback_submissions WHERE id = ?", SUBMISSION_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(submission_from_row).transpose()
    }

    async fn update_submission(
        &self,
        id: &str,
        update: SubmissionUpdate,
    ) -> Result<Option<FeedbackSubmission>> {
        let tags = update
            .demographic_tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // COALESCE keeps the stored value wherever the update has no field
        let result = sqlx::query(
            r#"
            UPDATE feedback_submissions SET
                original_language = COALESCE(?, original_language),
                translated_text = COALESCE(?, translated_text),
                sentiment_score = COALESCE(?, sentiment_score),
                sentiment_label = COALESCE(?, sentiment_label),
                inclusive_rewrite = COALESCE(?, inclusive_rewrite),
                demographic_tags = COALESCE(?, demographic_tags),
                processing_status = COALESCE(?, processing_status)
            WHERE id = ?
            "#,
        )
        .bind(&update.original_language)
        .bind(&update.translated_text)
        .bind(update.sentiment_score)
        .bind(update.sentiment_label.map(|l| l.as_str()))
        .bind(&update.inclusive_rewrite)
        .bind(&tags)
        .bind(update.processing_status.map(|s| s.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_submission(id).await
    }

    async fn list_submissions(&self) -> Result<Vec<FeedbackSubmission>> {
        let query = format!(
            "SELECT {} FROM feedback_submissions ORDER BY created_at DESC, rowid DESC",
            SUBMISSION_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(submission_from_row).collect()
    }

    async fn create_analysis(
        &self,
        submission_id: Option<String>,
        snapshot: AnalyticsSnapshot,
    ) -> Result<AnalysisResult> {
        let result = AnalysisResult {
            id: new_record_id(),
            submission_id,
            snapshot,
            created_at: time::now(),
        };
        let s = &result.snapshot;

        sqlx::query(
            r#"
            INSERT INTO analysis_results (
                id, submission_id, total_feedback, translated_count,
                demographic_groups, representation_gaps, sentiment_distribution,
                demographic_sentiment, insights, recommendations, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.id)
        .bind(&result.submission_id)
        .bind(i64::from(s.total_feedback))
        .bind(i64::from(s.translated_count))
        .bind(i64::from(s.demographic_groups))
        .bind(i64::from(s.representation_gaps))
        .bind(serde_json::to_string(&s.sentiment_distribution)?)
        .bind(serde_json::to_string(&s.demographic_sentiment)?)
        .bind(serde_json::to_string(&s.insights)?)
        .bind(serde_json::to_string(&s.recommendations)?)
        .bind(time::to_storage_string(&result.created_at))
        .execute(&self.pool)
        .await?;

        Ok(result)
    }

    async fn latest_analysis(&self) -> Result<Option<AnalysisResult>> {
        let query = format!(
            "SELECT {} FROM analysis_results ORDER BY created_at DESC, rowid DESC LIMIT 1",
            ANALYSIS_COLUMNS
        );
        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;

        row.as_ref().map(analysis_from_row).transpose()
    }

    async fn analysis_for_submission(&self, submission_id: &str) -> Result<Option<AnalysisResult>> {
        let query = format!(
            "SELECT {} FROM analysis_results WHERE submission_id = ? LIMIT 1",
            ANALYSIS_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(submission_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(analysis_from_row).transpose()
    }
}
