//! Enrichment, analytics and file handling services

pub mod analytics;
pub mod csv_export;
pub mod demographic_tagger;
pub mod enrichment_pipeline;
pub mod file_processor;
pub mod language_model;
pub mod openai_client;

pub use analytics::compute_snapshot;
pub use csv_export::{export_csv, EXPORT_FILENAME};
pub use demographic_tagger::{detect_demographic_tags, merge_tags};
pub use enrichment_pipeline::{EnrichmentPipeline, PipelineOutcome};
pub use file_processor::{parse_upload, FeedbackRow, FileProcessingError};
pub use language_model::{LanguageModel, LanguageModelError, SentimentAnalysis, Translation};
pub use openai_client::OpenAiClient;
