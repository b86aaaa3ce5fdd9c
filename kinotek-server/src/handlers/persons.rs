use axum::Json;
use axum::extract::{Path, State};
use kinotek_core::Page;
use kinotek_model::{Film, Person, Role};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::errors::{ApiError, ApiResult};
use crate::handlers::films::FilmItemResponse;
use crate::params::{SearchParams, Valid};

/// Page used when expanding a person's filmography; the film list rides the
/// person-level cache key, not the request's pagination.
const FILMOGRAPHY_PAGE: Page = Page {
    size: 50,
    number: 1,
};

const FILMOGRAPHY_SORT: &str = "imdb_rating";

#[derive(Debug, Serialize)]
pub struct PersonFilmResponse {
    pub uuid: Uuid,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct PersonResponse {
    pub uuid: Uuid,
    pub name: String,
    pub films: Vec<PersonFilmResponse>,
}

impl PersonResponse {
    pub fn from_models(person: &Person, films: &[Film]) -> Self {
        Self {
            uuid: person.id,
            name: person.name.clone(),
            films: films
                .iter()
                .map(|film| PersonFilmResponse {
                    uuid: film.id,
                    roles: film.roles_of(person.id),
                })
                .collect(),
        }
    }
}

pub async fn persons_search(
    State(state): State<AppState>,
    Valid(params): Valid<SearchParams>,
) -> ApiResult<Json<Vec<PersonResponse>>> {
    let persons = state
        .persons
        .search_by_name(
            &params.query,
            Page::new(params.page_size, params.page_number),
        )
        .await?;

    let mut responses = Vec::with_capacity(persons.len());
    for person in &persons {
        let films = state
            .films
            .get_films_with_person(person.id, FILMOGRAPHY_PAGE, FILMOGRAPHY_SORT)
            .await?;
        responses.push(PersonResponse::from_models(person, &films));
    }

    Ok(Json(responses))
}

pub async fn person_details(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
) -> ApiResult<Json<PersonResponse>> {
    let person = state
        .persons
        .get_by_id(person_id)
        .await?
        .ok_or_else(|| ApiError::not_found("person not found"))?;

    let films = state
        .films
        .get_films_with_person(person_id, FILMOGRAPHY_PAGE, FILMOGRAPHY_SORT)
        .await?;

    Ok(Json(PersonResponse::from_models(&person, &films)))
}

/// A known person with no films answers an empty list, not a 404.
pub async fn person_films(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
) -> ApiResult<Json<Vec<FilmItemResponse>>> {
    if state.persons.get_by_id(person_id).await?.is_none() {
        return Err(ApiError::not_found("person not found"));
    }

    let films = state
        .films
        .get_films_with_person(person_id, FILMOGRAPHY_PAGE, FILMOGRAPHY_SORT)
        .await?;

    Ok(Json(films.iter().map(FilmItemResponse::from_film).collect()))
}
