//! Persistence adapters
//!
//! One capability trait with three interchangeable backends. The backend is
//! chosen once at startup by [`select_store`]; remote backends that fail to
//! answer a probe query fall back to the in-memory store.

pub mod memory;
pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;
use civic_common::config::{ServiceConfig, StoragePreference};
use civic_common::{
    AnalysisResult, AnalyticsSnapshot, FeedbackSubmission, NewSubmission, Result, SubmissionUpdate,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// Which backend is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sql,
    Hosted,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Sql => "sql",
            StorageBackend::Hosted => "hosted",
        };
        f.write_str(s)
    }
}

/// Storage contract for submissions and analysis snapshots.
///
/// Lookups that miss return `Ok(None)`. Updates are partial merges with
/// last-write-wins semantics; there is no locking across calls.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    fn backend(&self) -> StorageBackend;

    async fn create_submission(&self, submission: NewSubmission) -> Result<FeedbackSubmission>;

    async fn get_submission(&self, id: &str) -> Result<Option<FeedbackSubmission>>;

    async fn update_submission(
        &self,
        id: &str,
        update: SubmissionUpdate,
    ) -> Result<Option<FeedbackSubmission>>;

    /// All submissions, newest first
    async fn list_submissions(&self) -> Result<Vec<FeedbackSubmission>>;

    async fn create_analysis(
        &self,
        submission_id: Option<String>,
        snapshot: AnalyticsSnapshot,
    ) -> Result<AnalysisResult>;

    async fn latest_analysis(&self) -> Result<Option<AnalysisResult>>;

    async fn analysis_for_submission(&self, submission_id: &str) -> Result<Option<AnalysisResult>>;
}

/// Fresh opaque identifier for new records
pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Pick and connect the storage backend.
///
/// Probe order for `auto`: hosted database, SQL database, memory. An
/// explicit preference only tries that backend. Any remote failure degrades
/// to memory instead of aborting startup.
pub async fn select_store(config: &ServiceConfig) -> Arc<dyn FeedbackStore> {
    let try_hosted = matches!(config.storage, StoragePreference::Auto | StoragePreference::Hosted);
    let try_sql = matches!(config.storage, StoragePreference::Auto | StoragePreference::Sql);

    if try_hosted {
        match &config.hosted_database {
            Some(hosted) => {
                info!(url = %hosted.url, "Attempting to connect to hosted database");
                match SupabaseStore::new(hosted) {
                    Ok(store) => match probe(&store).await {
                        Ok(()) => {
                            info!("✓ Hosted database connection successful");
                            return Arc::new(store);
                        }
                        Err(e) => error!(error = %e, "Hosted database probe failed"),
                    },
                    Err(e) => error!(error = %e, "Hosted database client could not be built"),
                }
                warn!("Falling back from hosted database");
            }
            None if config.storage == StoragePreference::Hosted => {
                warn!("Hosted storage requested but SUPABASE_URL/SUPABASE_ANON_KEY are not set");
            }
            None => {}
        }
    }

    if try_sql {
        match &config.database_url {
            Some(url) => {
                info!("Attempting to connect to SQL database");
                match SqliteStore::connect(url).await {
                    Ok(store) => match probe(&store).await {
                        Ok(()) => {
                            info!("✓ SQL database connection successful");
                            return Arc::new(store);
                        }
                        Err(e) => error!(error = %e, "SQL database probe failed"),
                    },
                    Err(e) => error!(error = %e, "SQL database connection failed"),
                }
                warn!("Falling back from SQL database");
            }
            None if config.storage == StoragePreference::Sql => {
                warn!("SQL storage requested but DATABASE_URL is not set (or USE_DATABASE=false)");
            }
            None => {}
        }
    }

    info!("Using in-memory storage");
    Arc::new(MemoryStore::new())
}

async fn probe(store: &dyn FeedbackStore) -> Result<()> {
    store.list_submissions().await.map(|_| ())
}
