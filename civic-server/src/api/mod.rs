//! HTTP API handlers for civic-server

pub mod analytics;
pub mod export;
pub mod feedback;
pub mod health;

pub use analytics::analytics_routes;
pub use export::export_routes;
pub use feedback::feedback_routes;
pub use health::health_routes;
