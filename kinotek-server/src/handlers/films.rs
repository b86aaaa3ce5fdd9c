use axum::Json;
use axum::extract::{Path, State};
use kinotek_core::Page;
use kinotek_model::{Film, Person};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::errors::{ApiError, ApiResult};
use crate::params::{FilmListParams, SearchParams, Valid};

/// List entry: just enough to render a catalog row.
#[derive(Debug, Serialize)]
pub struct FilmItemResponse {
    pub uuid: Uuid,
    pub title: String,
    pub imdb_rating: Option<f64>,
}

impl FilmItemResponse {
    pub fn from_film(film: &Film) -> Self {
        Self {
            uuid: film.id,
            title: film.title.clone(),
            imdb_rating: film.imdb_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenreRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct FilmDetailResponse {
    pub uuid: Uuid,
    pub title: String,
    pub imdb_rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<GenreRef>,
    pub actors: Vec<Person>,
    pub writers: Vec<Person>,
    pub directors: Vec<Person>,
}

impl FilmDetailResponse {
    pub fn from_film(film: Film) -> Self {
        Self {
            uuid: film.id,
            title: film.title,
            imdb_rating: film.imdb_rating,
            description: film.description,
            genre: film
                .genres
                .into_iter()
                .map(|g| GenreRef {
                    id: g.id,
                    name: g.name,
                })
                .collect(),
            actors: film.actors.into_iter().collect(),
            writers: film.writers.into_iter().collect(),
            directors: film.directors.into_iter().collect(),
        }
    }
}

pub async fn films_list(
    State(state): State<AppState>,
    Valid(params): Valid<FilmListParams>,
) -> ApiResult<Json<Vec<FilmItemResponse>>> {
    let films = state
        .films
        .list_films(
            Page::new(params.page_size, params.page_number),
            params.genre,
            &params.sort,
        )
        .await?;

    Ok(Json(films.iter().map(FilmItemResponse::from_film).collect()))
}

pub async fn films_search(
    State(state): State<AppState>,
    Valid(params): Valid<SearchParams>,
) -> ApiResult<Json<Vec<FilmItemResponse>>> {
    let films = state
        .films
        .search_films(
            &params.query,
            Page::new(params.page_size, params.page_number),
        )
        .await?;

    Ok(Json(films.iter().map(FilmItemResponse::from_film).collect()))
}

pub async fn film_details(
    State(state): State<AppState>,
    Path(film_id): Path<Uuid>,
) -> ApiResult<Json<FilmDetailResponse>> {
    let film = state
        .films
        .get_by_id(film_id)
        .await?
        .ok_or_else(|| ApiError::not_found("film not found"))?;

    Ok(Json(FilmDetailResponse::from_film(film)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinotek_model::{Genre, Role};

    #[test]
    fn detail_projection_renames_id_and_flattens_genres() {
        let film_id = Uuid::new_v4();
        let genre_id = Uuid::new_v4();

        let mut film = Film::new(film_id, "The Star", Some("desc".to_string()), Some(8.1));
        film.add_genre(Genre::new(genre_id, "Drama"));
        film.add_crew(Role::Actor, Person::new(Uuid::new_v4(), "Ann"));

        let detail = FilmDetailResponse::from_film(film);
        assert_eq!(detail.uuid, film_id);
        assert_eq!(detail.genre.len(), 1);
        assert_eq!(detail.genre[0].id, genre_id);
        assert_eq!(detail.genre[0].name, "Drama");
        assert_eq!(detail.actors.len(), 1);
        assert!(detail.writers.is_empty());

        let body = serde_json::to_value(&detail).unwrap();
        assert_eq!(body["uuid"], film_id.to_string().as_str());
        assert!(body.get("genre").is_some());
        assert!(body.get("genres").is_none());
    }

    #[test]
    fn list_projection_keeps_only_the_row_fields() {
        let film = Film::new(Uuid::new_v4(), "Quiet", None, None);
        let item = FilmItemResponse::from_film(&film);
        let body = serde_json::to_value(&item).unwrap();

        assert_eq!(body["title"], "Quiet");
        assert_eq!(body["imdb_rating"], serde_json::Value::Null);
        assert!(body.get("description").is_none());
    }
}
