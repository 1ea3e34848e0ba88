//! Store doubles

use async_trait::async_trait;
use civic_common::{
    AnalysisResult, AnalyticsSnapshot, Error, FeedbackSubmission, NewSubmission, ProcessingStatus,
    Result, SubmissionUpdate,
};
use civic_server::storage::{FeedbackStore, MemoryStore, StorageBackend};

/// Memory store that rejects the final "completed" write and analysis inserts
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for FlakyStore {
    fn backend(&self) -> StorageBackend {
        self.inner.backend()
    }

    async fn create_submission(&self, submission: NewSubmission) -> Result<FeedbackSubmission> {
        self.inner.create_submission(submission).await
    }

    async fn get_submission(&self, id: &str) -> Result<Option<FeedbackSubmission>> {
        self.inner.get_submission(id).await
    }

    async fn update_submission(
        &self,
        id: &str,
        update: SubmissionUpdate,
    ) -> Result<Option<FeedbackSubmission>> {
        if update.processing_status == Some(ProcessingStatus::Completed) {
            return Err(Error::Remote("write timed out".to_string()));
        }
        self.inner.update_submission(id, update).await
    }

    async fn list_submissions(&self) -> Result<Vec<FeedbackSubmission>> {
        self.inner.list_submissions().await
    }

    async fn create_analysis(
        &self,
        _submission_id: Option<String>,
        _snapshot: AnalyticsSnapshot,
    ) -> Result<AnalysisResult> {
        Err(Error::Remote("insert rejected".to_string()))
    }

    async fn latest_analysis(&self) -> Result<Option<AnalysisResult>> {
        self.inner.latest_analysis().await
    }

    async fn analysis_for_submission(&self, submission_id: &str) -> Result<Option<AnalysisResult>> {
        self.inner.analysis_for_submission(submission_id).await
    }
}
