//! Language model doubles

use async_trait::async_trait;
use civic_common::SentimentLabel;
use civic_server::services::{LanguageModel, LanguageModelError, SentimentAnalysis, Translation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns fixed answers, counts calls and records the text each stage saw
pub struct ScriptedModel {
    pub translated_text: String,
    pub detected_language: String,
    pub sentiment: SentimentAnalysis,
    pub rewrite: String,
    pub translate_calls: AtomicUsize,
    pub sentiment_calls: AtomicUsize,
    pub sentiment_inputs: Mutex<Vec<String>>,
    pub rewrite_inputs: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(translated_text: &str, detected_language: &str, label: SentimentLabel) -> Self {
        let score = match label {
            SentimentLabel::Positive => 0.7,
            SentimentLabel::Neutral => 0.0,
            SentimentLabel::Negative => -0.7,
        };
        Self {
            translated_text: translated_text.to_string(),
            detected_language: detected_language.to_string(),
            sentiment: SentimentAnalysis {
                score,
                label,
                confidence: 0.9,
            },
            rewrite: "Respectful rewrite".to_string(),
            translate_calls: AtomicUsize::new(0),
            sentiment_calls: AtomicUsize::new(0),
            sentiment_inputs: Mutex::new(Vec::new()),
            rewrite_inputs: Mutex::new(Vec::new()),
        }
    }

    /// Negative sentiment, Spanish detected
    pub fn negative_spanish() -> Self {
        Self::new("We need more buses", "Spanish", SentimentLabel::Negative)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn sentiment_calls(&self) -> usize {
        self.sentiment_calls.load(Ordering::SeqCst)
    }

    pub fn sentiment_inputs(&self) -> Vec<String> {
        self.sentiment_inputs.lock().unwrap().clone()
    }

    pub fn rewrite_inputs(&self) -> Vec<String> {
        self.rewrite_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn translate(
        &self,
        _text: &str,
        _target_language: &str,
    ) -> Result<Translation, LanguageModelError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Translation {
            translated_text: self.translated_text.clone(),
            detected_language: self.detected_language.clone(),
        })
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, LanguageModelError> {
        self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
        self.sentiment_inputs.lock().unwrap().push(text.to_string());
        Ok(self.sentiment)
    }

    async fn rewrite_inclusive(&self, text: &str) -> Result<String, LanguageModelError> {
        self.rewrite_inputs.lock().unwrap().push(text.to_string());
        Ok(self.rewrite.clone())
    }
}

/// Every call fails, as with a missing API key
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn translate(
        &self,
        _text: &str,
        _target_language: &str,
    ) -> Result<Translation, LanguageModelError> {
        Err(LanguageModelError::Api(401, "invalid api key".to_string()))
    }

    async fn analyze_sentiment(&self, _text: &str) -> Result<SentimentAnalysis, LanguageModelError> {
        Err(LanguageModelError::Network("connection refused".to_string()))
    }

    async fn rewrite_inclusive(&self, _text: &str) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::EmptyResponse)
    }
}
