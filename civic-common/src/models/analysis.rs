//! Aggregate analytics snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Integer percentages per sentiment label.
///
/// Each value is rounded independently, so the three need not sum to 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

/// Dashboard metrics computed from completed submissions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_feedback: u32,
    pub translated_count: u32,
    pub demographic_groups: u32,
    pub representation_gaps: u32,
    pub sentiment_distribution: SentimentDistribution,
    /// Keyed by demographic tag, ordered by tag name
    pub demographic_sentiment: BTreeMap<String, SentimentDistribution>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalyticsSnapshot {
    /// All-zero snapshot returned when nothing has completed yet
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Persisted analytics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    pub submission_id: Option<String>,
    #[serde(flatten)]
    pub snapshot: AnalyticsSnapshot,
    pub created_at: DateTime<Utc>,
}
