//! Test Helper Utilities
//!
//! Shared utilities for testing civic-server

#![allow(dead_code)]

pub mod fake_models;
pub mod fake_stores;

pub use fake_models::{FailingModel, ScriptedModel};
pub use fake_stores::FlakyStore;

use civic_common::{FeedbackSubmission, ProcessingStatus};
use civic_server::services::LanguageModel;
use civic_server::storage::{FeedbackStore, MemoryStore};
use civic_server::{build_router, AppState};
use std::sync::Arc;
use std::time::Duration;

/// Upload ceiling used by test apps
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// Router and state over an in-memory store
pub fn create_test_app(model: Arc<dyn LanguageModel>) -> (axum::Router, AppState) {
    create_test_app_with_store(Arc::new(MemoryStore::new()), model)
}

pub fn create_test_app_with_store(
    store: Arc<dyn FeedbackStore>,
    model: Arc<dyn LanguageModel>,
) -> (axum::Router, AppState) {
    let state = AppState::new(store, model, TEST_MAX_UPLOAD_BYTES);
    (build_router(state.clone()), state)
}

/// Poll until the submission reaches a terminal status (completed or failed)
pub async fn wait_until_settled(store: &dyn FeedbackStore, id: &str) -> FeedbackSubmission {
    for _ in 0..200 {
        let record = store
            .get_submission(id)
            .await
            .expect("store lookup failed")
            .expect("submission missing");
        if matches!(
            record.processing_status,
            ProcessingStatus::Completed | ProcessingStatus::Failed
        ) {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("submission {} never left pending/processing", id);
}

/// Poll until every stored submission has the given status
pub async fn wait_until_all(store: &dyn FeedbackStore, status: ProcessingStatus) -> Vec<FeedbackSubmission> {
    for _ in 0..200 {
        let records = store.list_submissions().await.expect("store list failed");
        if records.iter().all(|r| r.processing_status == status) {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("submissions never all reached {}", status);
}
