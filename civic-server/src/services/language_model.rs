//! Language model capability used by the enrichment pipeline
//!
//! Implementations normalize model output (defaults for missing fields,
//! clamped scores, lenient labels). Call failures are returned as errors;
//! the pipeline decides the fallback value.

use async_trait::async_trait;
use civic_common::SentimentLabel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language model client errors
#[derive(Debug, Error)]
pub enum LanguageModelError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned no content")]
    EmptyResponse,
}

/// Translated text plus the language the model detected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    pub detected_language: String,
}

/// Sentiment score in [-1, 1], label, and confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub score: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl SentimentAnalysis {
    /// Build from raw model values, clamping and defaulting as needed
    pub fn normalized(score: Option<f64>, label: Option<&str>, confidence: Option<f64>) -> Self {
        let clamp = |value: Option<f64>, lo: f64, hi: f64| {
            value.filter(|v| v.is_finite()).unwrap_or(0.0).clamp(lo, hi)
        };
        Self {
            score: clamp(score, -1.0, 1.0),
            label: label
                .map(SentimentLabel::from_model_output)
                .unwrap_or(SentimentLabel::Neutral),
            confidence: clamp(confidence, 0.0, 1.0),
        }
    }

    /// Value used when the sentiment call fails
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logging
    fn model_id(&self) -> &str;

    /// Translate `text` into `target_language` and detect its source language
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, LanguageModelError>;

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, LanguageModelError>;

    /// Rewrite in clear, respectful, culturally inclusive language
    async fn rewrite_inclusive(&self, text: &str) -> Result<String, LanguageModelError>;
}
