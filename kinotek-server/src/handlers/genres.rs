use axum::Json;
use axum::extract::{Path, State};
use kinotek_core::Page;
use kinotek_model::Genre;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::errors::{ApiError, ApiResult};
use crate::params::{PageParams, Valid};

#[derive(Debug, Serialize)]
pub struct GenreResponse {
    pub uuid: Uuid,
    pub name: String,
}

impl GenreResponse {
    pub fn from_genre(genre: &Genre) -> Self {
        Self {
            uuid: genre.id,
            name: genre.name.clone(),
        }
    }
}

pub async fn genres_list(
    State(state): State<AppState>,
    Valid(params): Valid<PageParams>,
) -> ApiResult<Json<Vec<GenreResponse>>> {
    let genres = state
        .genres
        .list_genres(Page::new(params.page_size, params.page_number))
        .await?;

    Ok(Json(genres.iter().map(GenreResponse::from_genre).collect()))
}

pub async fn genre_details(
    State(state): State<AppState>,
    Path(genre_id): Path<Uuid>,
) -> ApiResult<Json<GenreResponse>> {
    let genre = state
        .genres
        .get_by_id(genre_id)
        .await?
        .ok_or_else(|| ApiError::not_found("genre not found"))?;

    Ok(Json(GenreResponse::from_genre(&genre)))
}
