//! # kinotek Server
//!
//! Read-only HTTP query API over the film catalog's search index, with a
//! Redis read-through cache in front of every lookup.
//!
//! The server is built on Axum and exposes films, genres, and persons under
//! `/api/v1`; all join work happened upstream in the ETL, so a request is
//! one backend call plus a cache lookup.

/// Error types and handling
pub mod errors;

/// Query parameter validation
pub mod params;

/// Versioned route organization
pub mod routes;

/// Endpoint handlers
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use kinotek_core::{CacheStore, FilmService, GenreService, PersonService, SearchBackend};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Server application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub films: FilmService,
    pub genres: GenreService,
    pub persons: PersonService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires the three services onto one shared cache and search client.
    pub fn new(cache: Arc<dyn CacheStore>, search: Arc<dyn SearchBackend>) -> Self {
        Self {
            films: FilmService::new(cache.clone(), search.clone()),
            genres: GenreService::new(cache.clone(), search.clone()),
            persons: PersonService::new(cache, search),
        }
    }
}

/// Builds the complete application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::v1::create_v1_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
