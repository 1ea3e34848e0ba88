//! civic-server library interface
//!
//! Exposes the router, state and services for the binary and for
//! integration tests.

pub mod api;
pub mod error;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{EnrichmentPipeline, LanguageModel};
use crate::storage::FeedbackStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Selected persistence backend
    pub store: Arc<dyn FeedbackStore>,
    /// Background enrichment over the same store
    pub pipeline: EnrichmentPipeline,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Upload ceiling in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn FeedbackStore>,
        language_model: Arc<dyn LanguageModel>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            pipeline: EnrichmentPipeline::new(store.clone(), language_model),
            store,
            startup_time: Utc::now(),
            max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::feedback_routes(state.max_upload_bytes))
        .merge(api::analytics_routes())
        .merge(api::export_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
