//! Domain models shared by storage backends and HTTP handlers

pub mod analysis;
pub mod submission;

pub use analysis::{AnalysisResult, AnalyticsSnapshot, SentimentDistribution};
pub use submission::{
    FeedbackSubmission, NewSubmission, ProcessingStatus, SentimentLabel, SubmissionUpdate,
};
