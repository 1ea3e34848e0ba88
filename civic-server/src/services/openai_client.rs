//! Chat-completion API client (OpenAI-compatible)
//!
//! Every call sends a system prompt asking for a JSON object and parses the
//! first choice's message content.

use async_trait::async_trait;
use civic_common::config::LanguageModelConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::language_model::{LanguageModel, LanguageModelError, SentimentAnalysis, Translation};

const USER_AGENT: &str = concat!("civic-server/", env!("CARGO_PKG_VERSION"));

const SENTIMENT_PROMPT: &str = "You are a sentiment analysis expert. Analyze the sentiment of the text and provide a score from -1 to 1 (negative to positive), a label (positive, neutral, or negative), and a confidence score between 0 and 1. Respond with JSON in this format: { \"score\": number, \"label\": \"positive|neutral|negative\", \"confidence\": number }";

const REWRITE_PROMPT: &str = "You are an expert in inclusive language and civic communication. Rewrite the following community feedback in clear, respectful, culturally inclusive language without changing the core meaning. Make it appropriate for policymaker review. Respond with JSON in this format: { \"rewrittenText\": \"your rewritten version\" }";

fn translation_prompt(target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the given text to {} and detect the original language. Respond with JSON in this format: {{ \"translatedText\": \"translated content\", \"detectedLanguage\": \"language name\" }}",
        target_language
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationPayload {
    translated_text: Option<String>,
    detected_language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SentimentPayload {
    score: Option<f64>,
    label: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewritePayload {
    rewritten_text: Option<String>,
}

/// Parse message content into a payload; absent content counts as `{}`
fn parse_payload<T>(content: Option<&str>) -> Result<T, LanguageModelError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match content.map(str::trim).filter(|c| !c.is_empty()) {
        Some(content) => {
            serde_json::from_str(content).map_err(|e| LanguageModelError::Parse(e.to_string()))
        }
        None => Ok(T::default()),
    }
}

fn translation_from(payload: TranslationPayload, original: &str) -> Translation {
    Translation {
        translated_text: payload
            .translated_text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| original.to_string()),
        detected_language: payload
            .detected_language
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

fn rewrite_from(payload: RewritePayload, original: &str) -> String {
    payload
        .rewritten_text
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| original.to_string())
}

/// Chat-completion API client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    completions_url: String,
}

impl OpenAiClient {
    pub fn new(config: &LanguageModelConfig) -> Result<Self, LanguageModelError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LanguageModelError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            completions_url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Run one JSON-mode completion and return the raw message content
    async fn complete(&self, system_prompt: &str, text: &str) -> Result<Option<String>, LanguageModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        tracing::debug!(model = %self.model, chars = text.chars().count(), "Querying chat completion API");

        let response = self
            .http_client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LanguageModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LanguageModelError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LanguageModelError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LanguageModelError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, LanguageModelError> {
        let content = self.complete(&translation_prompt(target_language), text).await?;
        let payload: TranslationPayload = parse_payload(content.as_deref())?;
        Ok(translation_from(payload, text))
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, LanguageModelError> {
        let content = self.complete(SENTIMENT_PROMPT, text).await?;
        let payload: SentimentPayload = parse_payload(content.as_deref())?;
        Ok(SentimentAnalysis::normalized(
            payload.score,
            payload.label.as_deref(),
            payload.confidence,
        ))
    }

    async fn rewrite_inclusive(&self, text: &str) -> Result<String, LanguageModelError> {
        let content = self.complete(REWRITE_PROMPT, text).await?;
        let payload: RewritePayload = parse_payload(content.as_deref())?;
        Ok(rewrite_from(payload, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_common::SentimentLabel;

    fn config(base_url: &str) -> LanguageModelConfig {
        LanguageModelConfig {
            api_key: Some("sk-test".to_string()),
            model: "gpt-5".to_string(),
            base_url: base_url.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::new(&config("https://api.openai.com/v1/")).unwrap();
        assert!(client.is_configured());
        assert_eq!(client.completions_url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(client.model_id(), "gpt-5");
    }

    #[test]
    fn test_unconfigured_key() {
        let mut cfg = config("https://api.openai.com/v1");
        cfg.api_key = None;
        assert!(!OpenAiClient::new(&cfg).unwrap().is_configured());
    }

    #[test]
    fn test_translation_payload_defaults() {
        let payload: TranslationPayload = parse_payload(None).unwrap();
        let translation = translation_from(payload, "Hola");
        assert_eq!(translation.translated_text, "Hola");
        assert_eq!(translation.detected_language, "Unknown");

        let payload: TranslationPayload =
            parse_payload(Some(r#"{"translatedText":"Hello","detectedLanguage":"Spanish"}"#)).unwrap();
        let translation = translation_from(payload, "Hola");
        assert_eq!(translation.translated_text, "Hello");
        assert_eq!(translation.detected_language, "Spanish");
    }

    #[test]
    fn test_sentiment_payload_parsing() {
        let payload: SentimentPayload =
            parse_payload(Some(r#"{"score": -0.8, "label": "negative", "confidence": 0.95}"#)).unwrap();
        let analysis =
            SentimentAnalysis::normalized(payload.score, payload.label.as_deref(), payload.confidence);
        assert_eq!(analysis.label, SentimentLabel::Negative);
        assert_eq!(analysis.score, -0.8);
    }

    #[test]
    fn test_rewrite_payload_falls_back_to_original() {
        let payload: RewritePayload = parse_payload(Some("{}")).unwrap();
        assert_eq!(rewrite_from(payload, "original"), "original");
    }

    #[test]
    fn test_non_json_content_is_parse_error() {
        let result: Result<RewritePayload, _> = parse_payload(Some("Sure! Here's the rewrite"));
        assert!(matches!(result, Err(LanguageModelError::Parse(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "gpt-5",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "hi" },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_translation_prompt_names_target() {
        assert!(translation_prompt("English").contains("Translate the given text to English"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = OpenAiClient::new(&config("http://127.0.0.1:1/v1")).unwrap();
        let result = client.rewrite_inclusive("text").await;
        assert!(matches!(result, Err(LanguageModelError::Network(_))));
    }
}
