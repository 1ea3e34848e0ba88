//! In-memory store, also the fallback when no remote backend answers

use async_trait::async_trait;
use civic_common::{
    time, AnalysisResult, AnalyticsSnapshot, FeedbackSubmission, NewSubmission, Result,
    SubmissionUpdate,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{new_record_id, FeedbackStore, StorageBackend};

#[derive(Default)]
struct Tables {
    /// id → (insertion sequence, record)
    submissions: HashMap<String, (u64, FeedbackSubmission)>,
    /// Insertion order
    analyses: Vec<AnalysisResult>,
    next_seq: u64,
}

/// Process-local store; contents are lost on restart
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn create_submission(&self, submission: NewSubmission) -> Result<FeedbackSubmission> {
        let record = FeedbackSubmission::new(new_record_id(), submission, time::now());

        let mut tables = self.tables.write().await;
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables
            .submissions
            .insert(record.id.clone(), (seq, record.clone()));

        Ok(record)
    }

    async fn get_submission(&self, id: &str) -> Result<Option<FeedbackSubmission>> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.get(id).map(|(_, record)| record.clone()))
    }

    async fn update_submission(
        &self,
        id: &str,
        update: SubmissionUpdate,
    ) -> Result<Option<FeedbackSubmission>> {
        let mut tables = self.tables.write().await;
        Ok(tables.submissions.get_mut(id).map(|(_, record)| {
            update.apply_to(record);
            record.clone()
        }))
    }

    async fn list_submissions(&self) -> Result<Vec<FeedbackSubmission>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<&(u64, FeedbackSubmission)> = tables.submissions.values().collect();
        // Newest first; insertion order breaks timestamp ties
        entries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(entries.into_iter().map(|(_, record)| record.clone()).collect())
    }

    async fn create_analysis(
        &self,
        submission_id: Option<String>,
        snapshot: AnalyticsSnapshot,
    ) -> Result<AnalysisResult> {
        let result = AnalysisResult {
            id: new_record_id(),
            submission_id,
            snapshot,
            created_at: time::now(),
        };
        self.tables.write().await.analyses.push(result.clone());
        Ok(result)
    }

    async fn latest_analysis(&self) -> Result<Option<AnalysisResult>> {
        let tables = self.tables.read().await;
        // max_by_key keeps the last maximum, so later inserts win ties
        Ok(tables
            .analyses
            .iter()
            .max_by_key(|result| result.created_at)
            .cloned())
    }

    async fn analysis_for_submission(&self, submission_id: &str) -> Result<Option<AnalysisResult>> {
        let tables = self.tables.read().await;
        Ok(tables
            .analyses
            .iter()
            .find(|result| result.submission_id.as_deref() == Some(submission_id))
            .cloned())
    }
}
