use std::sync::Arc;

use kinotek_model::Person;
use uuid::Uuid;

use super::{ITEM_TTL, LIST_TTL, cached, store};
use crate::cache::CacheStore;
use crate::error::Result;
use crate::search::{Page, SearchBackend};

pub const PERSONS_INDEX: &str = "persons";

#[derive(Clone)]
pub struct PersonService {
    cache: Arc<dyn CacheStore>,
    search: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for PersonService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonService").finish_non_exhaustive()
    }
}

impl PersonService {
    pub fn new(cache: Arc<dyn CacheStore>, search: Arc<dyn SearchBackend>) -> Self {
        Self { cache, search }
    }

    pub async fn get_by_id(&self, person_id: Uuid) -> Result<Option<Person>> {
        let cache_key = format!("person:{person_id}");
        if let Some(person) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(Some(person));
        }

        let Some(doc) = self.search.get(PERSONS_INDEX, person_id).await? else {
            return Ok(None);
        };

        let person: Person = serde_json::from_value(doc)?;
        store(self.cache.as_ref(), &cache_key, &person, ITEM_TTL).await;

        Ok(Some(person))
    }

    pub async fn search_by_name(&self, name: &str, page: Page) -> Result<Vec<Person>> {
        let cache_key = format!("persons:search:{}:{}:{}", name, page.size, page.number);
        if let Some(persons) = cached(self.cache.as_ref(), &cache_key).await {
            return Ok(persons);
        }

        let docs = self
            .search
            .search_by_field(PERSONS_INDEX, "name", name, page, None)
            .await?;

        let persons = docs
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect::<Result<Vec<Person>>>()?;

        store(self.cache.as_ref(), &cache_key, &persons, LIST_TTL).await;

        Ok(persons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockCacheStore;
    use crate::search::MockSearchBackend;

    #[tokio::test]
    async fn search_by_name_matches_the_name_field_only() {
        let mut cache = MockCacheStore::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache
            .expect_set()
            .withf(|key, _, _| key == "persons:search:Ann:50:1")
            .return_once(|_, _, _| Ok(()));

        let mut search = MockSearchBackend::new();
        search
            .expect_search_by_field()
            .withf(|resource, field, text, page, sort| {
                resource == PERSONS_INDEX
                    && field == "name"
                    && text == "Ann"
                    && *page == Page::new(50, 1)
                    && sort.is_none()
            })
            .return_once(|_, _, _, _, _| {
                Ok(vec![serde_json::json!({ "id": Uuid::new_v4(), "name": "Ann" })])
            });

        let service = PersonService::new(Arc::new(cache), Arc::new(search));
        let persons = service.search_by_name("Ann", Page::new(50, 1)).await.unwrap();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].name, "Ann");
    }

    #[tokio::test]
    async fn get_by_id_stores_the_person_for_later_reads() {
        let id = Uuid::new_v4();

        let mut cache = MockCacheStore::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache
            .expect_set()
            .withf(move |key, _, ttl| key == format!("person:{id}") && *ttl == ITEM_TTL)
            .return_once(|_, _, _| Ok(()));

        let mut search = MockSearchBackend::new();
        search
            .expect_get()
            .return_once(move |_, _| Ok(Some(serde_json::json!({ "id": id, "name": "Howard" }))));

        let service = PersonService::new(Arc::new(cache), Arc::new(search));
        let person = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(person.name, "Howard");
    }
}
