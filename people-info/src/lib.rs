//! people-info library - person profile service
//!
//! Stores people (name, surname, patronymic) enriched with age, gender and
//! nationality inferred by external services, and lists them with filters
//! and offset pagination.

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    Router,
};
use people_common::config::PaginationConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;
use url::Url;

pub mod api;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod pagination;
pub mod query;
pub mod validation;

pub use db::{PersonPage, PersonStore, SqlitePersonStore};
pub use enrichment::EnrichmentOrchestrator;
pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PersonStore>,
    pub enrichment: Arc<EnrichmentOrchestrator>,
    /// Window defaults and the maximum accepted limit
    pub pagination: PaginationConfig,
    /// Scheme + host for pagination links (None = derive from request)
    pub public_base_url: Option<Url>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: Arc<dyn PersonStore>,
        enrichment: Arc<EnrichmentOrchestrator>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            store,
            enrichment,
            pagination,
            public_base_url: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_public_base_url(mut self, public_base_url: Option<Url>) -> Self {
        self.public_base_url = public_base_url;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        .route(
            "/api/v1/persons",
            post(api::create_person).get(api::list_persons),
        )
        .route(
            "/api/v1/persons/:id",
            get(api::get_person)
                .patch(api::update_person)
                .delete(api::delete_person),
        )
        .merge(api::docs_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(error::handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
