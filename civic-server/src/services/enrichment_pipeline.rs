//! Per-submission enrichment: translate → sentiment → rewrite → tag → persist
//!
//! Language model failures fall back locally and never fail a run. Storage
//! errors abort the run and mark the submission `failed`.

use civic_common::{FeedbackSubmission, ProcessingStatus, Result, SubmissionUpdate};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::demographic_tagger::{detect_demographic_tags, merge_tags};
use super::language_model::{LanguageModel, SentimentAnalysis, Translation};
use crate::storage::FeedbackStore;

/// Language every submission is translated into
pub const TARGET_LANGUAGE: &str = "English";

const UNKNOWN_LANGUAGE: &str = "Unknown";

/// How a pipeline run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    /// Record was not pending; left untouched
    Skipped(ProcessingStatus),
    NotFound,
    Failed,
}

/// Enrichment pipeline over shared store and model handles
#[derive(Clone)]
pub struct EnrichmentPipeline {
    store: Arc<dyn FeedbackStore>,
    model: Arc<dyn LanguageModel>,
}

impl EnrichmentPipeline {
    pub fn new(store: Arc<dyn FeedbackStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self { store, model }
    }

    /// Run the pipeline for `submission_id` on a background task
    pub fn spawn(&self, submission_id: String) -> JoinHandle<PipelineOutcome> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.process(&submission_id).await })
    }

    /// Run the pipeline to completion for one submission
    pub async fn process(&self, submission_id: &str) -> PipelineOutcome {
        match self.run(submission_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(submission_id, error = %e, "Enrichment failed");
                if let Err(e) = self
                    .store
                    .update_submission(submission_id, SubmissionUpdate::status(ProcessingStatus::Failed))
                    .await
                {
                    error!(submission_id, error = %e, "Could not mark submission as failed");
                }
                PipelineOutcome::Failed
            }
        }
    }

    async fn run(&self, submission_id: &str) -> Result<PipelineOutcome> {
        let Some(submission) = self.store.get_submission(submission_id).await? else {
            warn!(submission_id, "Submission not found, nothing to enrich");
            return Ok(PipelineOutcome::NotFound);
        };

        if !submission
            .processing_status
            .can_transition_to(ProcessingStatus::Processing)
        {
            warn!(
                submission_id,
                status = %submission.processing_status,
                "Submission is not pending, skipping enrichment"
            );
            return Ok(PipelineOutcome::Skipped(submission.processing_status));
        }

        let marked = self
            .store
            .update_submission(submission_id, SubmissionUpdate::status(ProcessingStatus::Processing))
            .await?;
        if marked.is_none() {
            warn!(submission_id, "Submission disappeared before processing");
            return Ok(PipelineOutcome::NotFound);
        }

        info!(submission_id, model = self.model.model_id(), "Enrichment started");

        let translation = self.translate_stage(&submission).await;
        let sentiment = self.sentiment_stage(submission_id, &translation.translated_text).await;
        let rewrite = self.rewrite_stage(submission_id, &translation.translated_text).await;

        let detected = detect_demographic_tags(
            &submission.original_text,
            Some(translation.detected_language.as_str()),
        );
        let tags = merge_tags(&submission.demographic_tags, &detected);
        debug!(submission_id, stage = "tagging", tags = ?tags, "Demographic tags assigned");

        let update = SubmissionUpdate {
            original_language: Some(translation.detected_language),
            translated_text: Some(translation.translated_text),
            sentiment_score: Some(sentiment.score),
            sentiment_label: Some(sentiment.label),
            inclusive_rewrite: Some(rewrite),
            demographic_tags: Some(tags),
            processing_status: Some(ProcessingStatus::Completed),
        };

        match self.store.update_submission(submission_id, update).await? {
            Some(_) => {
                info!(submission_id, label = %sentiment.label, "Enrichment completed");
                Ok(PipelineOutcome::Completed)
            }
            None => {
                warn!(submission_id, "Submission disappeared before results were stored");
                Ok(PipelineOutcome::NotFound)
            }
        }
    }

    /// Declared English skips the model call
    async fn translate_stage(&self, submission: &FeedbackSubmission) -> Translation {
        let submission_id = submission.id.as_str();

        if submission.original_language.as_deref() == Some(TARGET_LANGUAGE) {
            debug!(submission_id, stage = "translation", "Declared English, not translating");
            return Translation {
                translated_text: submission.original_text.clone(),
                detected_language: TARGET_LANGUAGE.to_string(),
            };
        }

        match self
            .model
            .translate(&submission.original_text, TARGET_LANGUAGE)
            .await
        {
            Ok(translation) => {
                debug!(
                    submission_id,
                    stage = "translation",
                    detected_language = %translation.detected_language,
                    "Translated"
                );
                translation
            }
            Err(e) => {
                warn!(submission_id, stage = "translation", error = %e, "Translation failed, keeping original text");
                Translation {
                    translated_text: submission.original_text.clone(),
                    detected_language: UNKNOWN_LANGUAGE.to_string(),
                }
            }
        }
    }

    async fn sentiment_stage(&self, submission_id: &str, text: &str) -> SentimentAnalysis {
        match self.model.analyze_sentiment(text).await {
            Ok(analysis) => {
                debug!(
                    submission_id,
                    stage = "sentiment",
                    score = analysis.score,
                    label = %analysis.label,
                    "Sentiment scored"
                );
                analysis
            }
            Err(e) => {
                warn!(submission_id, stage = "sentiment", error = %e, "Sentiment analysis failed, using neutral");
                SentimentAnalysis::neutral()
            }
        }
    }

    async fn rewrite_stage(&self, submission_id: &str, text: &str) -> String {
        match self.model.rewrite_inclusive(text).await {
            Ok(rewrite) => rewrite,
            Err(e) => {
                warn!(submission_id, stage = "rewrite", error = %e, "Inclusive rewrite failed, keeping text");
                text.to_string()
            }
        }
    }
}
