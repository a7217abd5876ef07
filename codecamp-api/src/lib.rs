//! codecamp-api library - conference management REST service
//!
//! Camps, the talks given at them, and the speakers giving those talks.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod error;
pub mod mapping;
pub mod models;
pub mod repository;
pub mod seed;

use api::links::{CAMP_ROUTE, TALK_ROUTE};
use repository::{CampRepository, RepositoryProvider};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Source of per-request repositories
    pub repositories: Arc<dyn RepositoryProvider>,
}

impl AppState {
    /// Create application state backed by `db`
    pub fn new(db: SqlitePool) -> Self {
        Self::with_provider(Arc::new(db))
    }

    pub fn with_provider(repositories: Arc<dyn RepositoryProvider>) -> Self {
        Self { repositories }
    }

    /// Fresh repository for one request
    pub fn repository(&self) -> Box<dyn CampRepository> {
        self.repositories.repository()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let camps = Router::new()
        .route("/api/camps", get(api::get_camps).post(api::create_camp))
        .route("/api/camps/search", get(api::search_by_date))
        .route(
            CAMP_ROUTE,
            get(api::get_camp)
                .put(api::update_camp)
                .delete(api::delete_camp),
        );

    let talks = Router::new()
        .route(
            "/api/camps/:moniker/talks",
            get(api::get_talks).post(api::create_talk),
        )
        .route(
            TALK_ROUTE,
            get(api::get_talk)
                .put(api::update_talk)
                .delete(api::delete_talk),
        );

    Router::new()
        .merge(camps)
        .merge(talks)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
