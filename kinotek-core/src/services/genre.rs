use std::sync::Arc;

use kinotek_model::Genre;
use uuid::Uuid;

use super::{ITEM_TTL, LIST_TTL, cached, store};
use crate::cache::CacheStore;
use crate::error::Result;
use crate::search::{Page, SearchBackend};

pub const GENRES_INDEX: &str = "genres";

#[derive(Clone)]
pub struct GenreService {
    cache: Arc<dyn CacheStore>,
    search: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for GenreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenreService").finish_non_exhaustive()
    }
}

impl GenreService {
    pub fn new(cache: Arc<dyn CacheStore>, search: Arc<dyn SearchBackend>) -> Self {
        Self { cache, search }
    }

    pub async fn get_by_id(&self, genre_id: Uuid) -> Result<Option<Genre>> {
        let cache_key = format!("genre:{genre_id}");
        if let Some(genre) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(Some(genre));
        }

        let Some(doc) = self.search.get(GENRES_INDEX, genre_id).await? else {
            return Ok(None);
        };

        let genre: Genre = serde_json::from_value(doc)?;
        store(self.cache.as_ref(), &cache_key, &genre, ITEM_TTL).await;

        Ok(Some(genre))
    }

    pub async fn list_genres(&self, page: Page) -> Result<Vec<Genre>> {
        let cache_key = format!("genres:list:{}:{}", page.size, page.number);
        if let Some(genres) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(genres);
        }

        let docs = self.search.list(GENRES_INDEX, page, None).await?;
        let genres = docs
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect::<Result<Vec<Genre>>>()?;

        store(self.cache.as_ref(), &cache_key, &genres, LIST_TTL).await;

        Ok(genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockCacheStore;
    use crate::search::MockSearchBackend;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn list_genres_caches_the_page_under_its_own_key() {
        let mut cache = MockCacheStore::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache
            .expect_set()
            .withf(|key, _, ttl| key == "genres:list:40:2" && *ttl == LIST_TTL)
            .return_once(|_, _, _| Ok(()));

        let mut search = MockSearchBackend::new();
        search
            .expect_list()
            .withf(|resource, page, sort| {
                resource == GENRES_INDEX && *page == Page::new(40, 2) && sort.is_none()
            })
            .return_once(|_, _, _| {
                Ok(vec![
                    serde_json::json!({ "id": Uuid::new_v4(), "name": "Drama" }),
                ])
            });

        let service = GenreService::new(Arc::new(cache), Arc::new(search));
        let genres = service.list_genres(Page::new(40, 2)).await.unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name, "Drama");
    }

    #[tokio::test]
    async fn get_by_id_round_trips_through_the_cache() {
        let id = Uuid::new_v4();

        let mut cache = MockCacheStore::new();
        cache
            .expect_get()
            .with(eq(format!("genre:{id}")))
            .return_once(|_| Ok(None));
        cache
            .expect_set()
            .withf(|_, _, ttl| *ttl == ITEM_TTL)
            .return_once(|_, _, _| Ok(()));

        let mut search = MockSearchBackend::new();
        search
            .expect_get()
            .with(eq(GENRES_INDEX), eq(id))
            .return_once(move |_, _| {
                Ok(Some(serde_json::json!({ "id": id, "name": "Horror" })))
            });

        let service = GenreService::new(Arc::new(cache), Arc::new(search));
        let genre = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(genre.name, "Horror");
    }

    #[tokio::test]
    async fn unknown_genre_is_none() {
        let mut cache = MockCacheStore::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache.expect_set().times(0);

        let mut search = MockSearchBackend::new();
        search.expect_get().return_once(|_, _| Ok(None));

        let service = GenreService::new(Arc::new(cache), Arc::new(search));
        assert!(service.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
