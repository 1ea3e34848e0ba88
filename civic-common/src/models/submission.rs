//! Feedback submission record and its processing state machine
//!
//! A submission progresses through:
//! PENDING → PROCESSING → COMPLETED | FAILED

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Processing status of a feedback submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Stored, enrichment not started
    Pending,
    /// Enrichment pipeline running
    Processing,
    /// Enrichment finished and persisted
    Completed,
    /// Enrichment aborted by an unrecoverable error
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        matches!(
            (self, next),
            (ProcessingStatus::Pending, ProcessingStatus::Processing)
                | (ProcessingStatus::Processing, ProcessingStatus::Completed)
                | (ProcessingStatus::Processing, ProcessingStatus::Failed)
        )
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown processing status: {}",
                other
            ))),
        }
    }
}

/// Sentiment label assigned by the language model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }

    /// Lenient parse: anything other than the three known labels is neutral
    pub fn from_model_output(label: &str) -> Self {
        label.parse().unwrap_or(SentimentLabel::Neutral)
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown sentiment label: {}",
                other
            ))),
        }
    }
}

/// One unit of civic feedback and its derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub id: String,
    pub original_text: String,
    /// Declared at ingestion, replaced by the detected language after enrichment
    pub original_language: Option<String>,
    pub translated_text: Option<String>,
    /// -1.0 (negative) to 1.0 (positive)
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    pub inclusive_rewrite: Option<String>,
    pub demographic_tags: Vec<String>,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
}

impl FeedbackSubmission {
    /// Build a fresh pending record
    pub fn new(id: String, input: NewSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            original_text: input.original_text,
            original_language: input.original_language,
            translated_text: None,
            sentiment_score: None,
            sentiment_label: None,
            inclusive_rewrite: None,
            demographic_tags: input.demographic_tags,
            processing_status: ProcessingStatus::Pending,
            created_at,
        }
    }

    /// Translation happened and produced something other than the input
    pub fn was_translated(&self) -> bool {
        self.translated_text
            .as_deref()
            .is_some_and(|t| t != self.original_text)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.demographic_tags.iter().any(|t| t == tag)
    }
}

/// Fields accepted at ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub original_text: String,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub demographic_tags: Vec<String>,
}

impl NewSubmission {
    pub fn new(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.original_language = language;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.demographic_tags = tags;
        self
    }
}

/// Partial update: only `Some` fields overwrite the stored record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_label: Option<SentimentLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive_rewrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographic_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_status: Option<ProcessingStatus>,
}

impl SubmissionUpdate {
    /// Update that only changes the status
    pub fn status(status: ProcessingStatus) -> Self {
        Self {
            processing_status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SubmissionUpdate::default()
    }

    /// Merge present fields into `record`
    pub fn apply_to(&self, record: &mut FeedbackSubmission) {
        if let Some(language) = &self.original_language {
            record.original_language = Some(language.clone());
        }
        if let Some(text) = &self.translated_text {
            record.translated_text = Some(text.clone());
        }
        if let Some(score) = self.sentiment_score {
            record.sentiment_score = Some(score);
        }
        if let Some(label) = self.sentiment_label {
            record.sentiment_label = Some(label);
        }
        if let Some(rewrite) = &self.inclusive_rewrite {
            record.inclusive_rewrite = Some(rewrite.clone());
        }
        if let Some(tags) = &self.demographic_tags {
            record.demographic_tags = tags.clone();
        }
        if let Some(status) = self.processing_status {
            record.processing_status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeedbackSubmission {
        FeedbackSubmission::new(
            "abc".to_string(),
            NewSubmission::new("The park needs lights").with_tags(vec!["Urban".to_string()]),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_submission_is_pending() {
        let record = sample();
        assert_eq!(record.processing_status, ProcessingStatus::Pending);
        assert!(record.translated_text.is_none());
        assert_eq!(record.demographic_tags, vec!["Urban".to_string()]);
    }

    #[test]
    fn test_status_transitions() {
        use ProcessingStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
    }

    #[test]
    fn test_status_roundtrips_through_str() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ProcessingStatus>().unwrap(), status);
        }
        assert!("done".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_unknown_label_is_neutral() {
        assert_eq!(SentimentLabel::from_model_output("negative"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_model_output("Mixed"), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_model_output(""), SentimentLabel::Neutral);
    }

    #[test]
    fn test_update_merges_only_present_fields() {
        let mut record = sample();
        let update = SubmissionUpdate {
            sentiment_score: Some(-0.4),
            sentiment_label: Some(SentimentLabel::Negative),
            ..SubmissionUpdate::status(ProcessingStatus::Processing)
        };

        update.apply_to(&mut record);

        assert_eq!(record.processing_status, ProcessingStatus::Processing);
        assert_eq!(record.sentiment_score, Some(-0.4));
        assert_eq!(record.sentiment_label, Some(SentimentLabel::Negative));
        assert_eq!(record.original_text, "The park needs lights");
        assert_eq!(record.demographic_tags, vec!["Urban".to_string()]);
        assert!(record.inclusive_rewrite.is_none());
    }

    #[test]
    fn test_was_translated() {
        let mut record = sample();
        assert!(!record.was_translated());

        record.translated_text = Some(record.original_text.clone());
        assert!(!record.was_translated());

        record.translated_text = Some("Different".to_string());
        assert!(record.was_translated());
    }

    #[test]
    fn test_json_uses_camel_case_and_lowercase_enums() {
        let mut record = sample();
        record.sentiment_label = Some(SentimentLabel::Positive);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["originalText"], "The park needs lights");
        assert_eq!(json["processingStatus"], "pending");
        assert_eq!(json["sentimentLabel"], "positive");
        assert!(json["demographicTags"].is_array());
        assert!(json.get("original_text").is_none());
    }

    #[test]
    fn test_update_serialization_skips_absent_fields() {
        let json = serde_json::to_value(SubmissionUpdate::status(ProcessingStatus::Failed)).unwrap();
        assert_eq!(json, serde_json::json!({ "processingStatus": "failed" }));
        assert!(SubmissionUpdate::default().is_empty());
    }
}
