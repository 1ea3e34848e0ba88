//! SQL store tests against in-memory and file-backed SQLite

use civic_common::{
    AnalyticsSnapshot, NewSubmission, ProcessingStatus, SentimentDistribution, SentimentLabel,
    SubmissionUpdate,
};
use civic_server::storage::{FeedbackStore, SqliteStore, StorageBackend};
use std::collections::BTreeMap;

async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}

#[tokio::test]
async fn test_create_and_get_round_trip() {
    let store = memory_store().await;
    assert_eq!(store.backend(), StorageBackend::Sql);

    let created = store
        .create_submission(
            NewSubmission::new("Need safer crossings near the school")
                .with_language(Some("English".to_string()))
                .with_tags(vec!["Youth (18-25)".to_string()]),
        )
        .await
        .unwrap();

    let fetched = store.get_submission(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.processing_status, ProcessingStatus::Pending);
    assert_eq!(fetched.demographic_tags, vec!["Youth (18-25)".to_string()]);

    assert!(store.get_submission("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_partial_update_keeps_absent_fields() {
    let store = memory_store().await;
    let created = store
        .create_submission(
            NewSubmission::new("Libraries should open later")
                .with_language(Some("English".to_string()))
                .with_tags(vec!["Urban".to_string()]),
        )
        .await
        .unwrap();

    let updated = store
        .update_submission(
            &created.id,
            SubmissionUpdate {
                sentiment_score: Some(0.4),
                sentiment_label: Some(SentimentLabel::Positive),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.sentiment_score, Some(0.4));
    assert_eq!(updated.sentiment_label, Some(SentimentLabel::Positive));
    assert_eq!(updated.original_language.as_deref(), Some("English"));
    assert_eq!(updated.demographic_tags, vec!["Urban".to_string()]);
    assert_eq!(updated.processing_status, ProcessingStatus::Pending);
    assert_eq!(updated.created_at, created.created_at);

    let completed = store
        .update_submission(
            &created.id,
            SubmissionUpdate {
                demographic_tags: Some(vec!["Urban".to_string(), "Elderly (65+)".to_string()]),
                processing_status: Some(ProcessingStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.processing_status, ProcessingStatus::Completed);
    assert_eq!(completed.sentiment_label, Some(SentimentLabel::Positive));
    assert_eq!(completed.demographic_tags.len(), 2);
}

#[tokio::test]
async fn test_update_unknown_id_is_none() {
    let store = memory_store().await;
    let result = store
        .update_submission("missing", SubmissionUpdate::status(ProcessingStatus::Failed))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let store = memory_store().await;
    let mut ids = Vec::new();
    for text in ["one", "two", "three"] {
        ids.push(store.create_submission(NewSubmission::new(text)).await.unwrap().id);
    }

    let listed: Vec<String> = store
        .list_submissions()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_analysis_round_trip() {
    let store = memory_store().await;
    assert!(store.latest_analysis().await.unwrap().is_none());

    // submission_id references feedback_submissions
    let submission = store
        .create_submission(NewSubmission::new("Rural broadband please"))
        .await
        .unwrap();

    let mut per_group = BTreeMap::new();
    per_group.insert(
        "Rural".to_string(),
        SentimentDistribution {
            positive: 0,
            neutral: 0,
            negative: 100,
        },
    );
    let snapshot = AnalyticsSnapshot {
        total_feedback: 1,
        translated_count: 0,
        demographic_groups: 1,
        representation_gaps: 2,
        sentiment_distribution: SentimentDistribution {
            positive: 0,
            neutral: 0,
            negative: 100,
        },
        demographic_sentiment: per_group,
        insights: vec!["Rural communities report 100% negative sentiment".to_string()],
        recommendations: vec!["Implement targeted engagement programs for Rural communities".to_string()],
    };

    store.create_analysis(None, AnalyticsSnapshot::empty()).await.unwrap();
    let stored = store
        .create_analysis(Some(submission.id.clone()), snapshot.clone())
        .await
        .unwrap();

    let latest = store.latest_analysis().await.unwrap().unwrap();
    assert_eq!(latest.id, stored.id);
    assert_eq!(latest.snapshot, snapshot);

    let by_submission = store
        .analysis_for_submission(&submission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_submission.id, stored.id);
    assert!(store.analysis_for_submission("other").await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("civic.db").display()
    );

    let id = {
        let store = SqliteStore::connect(&url).await.unwrap();
        store
            .create_submission(NewSubmission::new("Keep the pool open"))
            .await
            .unwrap()
            .id
    };

    let reopened = SqliteStore::connect(&url).await.unwrap();
    let fetched = reopened.get_submission(&id).await.unwrap().unwrap();
    assert_eq!(fetched.original_text, "Keep the pool open");
}
