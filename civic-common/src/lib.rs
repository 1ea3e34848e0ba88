//! # Civic Feedback Common Library
//!
//! Shared code for the civic feedback service:
//! - Domain models (submissions, analysis snapshots)
//! - Common error type
//! - Configuration loading and resolution
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{
    AnalysisResult, AnalyticsSnapshot, FeedbackSubmission, NewSubmission, ProcessingStatus,
    SentimentDistribution, SentimentLabel, SubmissionUpdate,
};
