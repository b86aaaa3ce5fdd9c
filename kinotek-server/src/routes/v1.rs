use axum::{Router, routing::get};

use crate::AppState;
use crate::handlers::{films, genres, persons};

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/films/", get(films::films_list))
        .route("/films/search", get(films::films_search))
        .route("/films/{film_id}", get(films::film_details))
        .route("/genres/", get(genres::genres_list))
        .route("/genres/{genre_id}", get(genres::genre_details))
        .route("/persons/search", get(persons::persons_search))
        .route("/persons/{person_id}/films", get(persons::person_films))
        .route("/persons/{person_id}", get(persons::person_details))
}
