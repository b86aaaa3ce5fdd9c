use std::sync::Arc;

use kinotek_model::Film;
use serde_json::Value;
use uuid::Uuid;

use super::{ITEM_TTL, LIST_TTL, cached, store};
use crate::cache::CacheStore;
use crate::error::Result;
use crate::search::{Page, SearchBackend, query};

pub const MOVIES_INDEX: &str = "movies";

/// Fields the film full-text search matches against, with the title boosted
/// over the derived name fields.
const SEARCH_FIELDS: [&str; 6] = [
    "title^3",
    "description",
    "genres_names",
    "actors_names",
    "directors_names",
    "writers_names",
];

#[derive(Clone)]
pub struct FilmService {
    cache: Arc<dyn CacheStore>,
    search: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for FilmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilmService").finish_non_exhaustive()
    }
}

impl FilmService {
    pub fn new(cache: Arc<dyn CacheStore>, search: Arc<dyn SearchBackend>) -> Self {
        Self { cache, search }
    }

    pub async fn get_by_id(&self, film_id: Uuid) -> Result<Option<Film>> {
        let cache_key = format!("film:{film_id}");
        if let Some(film) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(Some(film));
        }

        let Some(doc) = self.search.get(MOVIES_INDEX, film_id).await? else {
            return Ok(None);
        };

        let film: Film = serde_json::from_value(doc)?;
        store(self.cache.as_ref(), &cache_key, &film, ITEM_TTL).await;

        Ok(Some(film))
    }

    pub async fn search_films(&self, text: &str, page: Page) -> Result<Vec<Film>> {
        let cache_key = format!("film:search:{}:{}:{}", text, page.size, page.number);
        if let Some(films) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(films);
        }

        let docs = self
            .search
            .search_raw(
                MOVIES_INDEX,
                query::multi_match(text, &SEARCH_FIELDS),
                page,
                None,
            )
            .await?;

        let films = decode_films(docs)?;
        store(self.cache.as_ref(), &cache_key, &films, LIST_TTL).await;

        Ok(films)
    }

    pub async fn list_films(
        &self,
        page: Page,
        genre_id: Option<Uuid>,
        sort: &str,
    ) -> Result<Vec<Film>> {
        let genre_key = genre_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "None".to_string());
        let cache_key = format!(
            "films:list:{}:{}:{}:{}",
            sort, genre_key, page.size, page.number
        );
        if let Some(films) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(films);
        }

        let filter = match genre_id {
            None => query::match_all(),
            Some(id) => query::nested_term("genres", "id", &id.to_string()),
        };

        let docs = self
            .search
            .search_raw(MOVIES_INDEX, filter, page, Some(sort))
            .await?;

        let films = decode_films(docs)?;
        store(self.cache.as_ref(), &cache_key, &films, LIST_TTL).await;

        Ok(films)
    }

    /// Films in which the person appears under any role, rated best first
    /// unless told otherwise.
    pub async fn get_films_with_person(
        &self,
        person_id: Uuid,
        page: Page,
        sort: &str,
    ) -> Result<Vec<Film>> {
        let cache_key = format!("person:{person_id}:roles");
        if let Some(films) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(films);
        }

        let id = person_id.to_string();
        let filter = query::should(vec![
            query::nested_term("actors", "id", &id),
            query::nested_term("directors", "id", &id),
            query::nested_term("writers", "id", &id),
        ]);

        let docs = self
            .search
            .search_raw(MOVIES_INDEX, filter, page, Some(sort))
            .await?;

        let films = decode_films(docs)?;
        store(self.cache.as_ref(), &cache_key, &films, LIST_TTL).await;

        Ok(films)
    }
}

fn decode_films(docs: Vec<Value>) -> Result<Vec<Film>> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Into::into))
        .collect()
}
