//! HTTP server.
//!
//! This module provides:
//! - Asset, listing page, and listing query endpoints using axum
//! - Health and metrics endpoints
//! - Tracing and Prometheus setup

mod app;
mod assets;
pub mod metrics;
mod observability;
mod rest;

pub use app::{App, ServerConfig};
pub use assets::{create_asset_router, AppState};
pub use metrics::init_metrics;
pub use observability::{init_tracing, spans, SessionLog, TracingConfig, SESSION_LOG_DIR};
pub use rest::{create_rest_router, HealthResponse};
