//! Axum HTTP server for chromashot.
//!
//! This crate provides:
//! - The upload → convert → serve-once pipeline over HTTP
//! - Health, readiness and Prometheus endpoints
//! - Background sweeping of abandoned artifacts

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod templates;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::ArtifactSweeper;
pub use state::AppState;
