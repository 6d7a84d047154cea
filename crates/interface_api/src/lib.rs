//! HTTP API Layer
//!
//! Serves the case overview as JSON using Axum.
//!
//! # Routes
//!
//! | route                            | handler                      |
//! |----------------------------------|------------------------------|
//! | `GET /health`                    | liveness                     |
//! | `GET /health/ready`              | case store health check      |
//! | `GET /api/v1/cases/:id/overview` | runs the case overview load  |
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(Arc::new(PostgresCaseStore::new(pool)), options);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_case::{CaseOverviewPipeline, CaseStorePort, PipelineOptions};

use crate::handlers::{cases, health};
use crate::middleware::request_log;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CaseStorePort>,
    pub pipeline: Arc<CaseOverviewPipeline>,
}

impl AppState {
    /// Builds the state with one pipeline over `store`
    pub fn new(store: Arc<dyn CaseStorePort>, options: PipelineOptions) -> Self {
        let pipeline = Arc::new(CaseOverviewPipeline::new(store.clone(), options));
        Self { store, pipeline }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let case_routes = Router::new().route("/:id/overview", get(cases::get_overview));

    let api_routes = Router::new()
        .nest("/cases", case_routes)
        .layer(axum_middleware::from_fn(request_log));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
