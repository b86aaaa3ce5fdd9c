//! Index bootstrap and bulk loading.

use std::sync::Arc;

use kinotek_core::{Result, SearchBackend};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

const MOVIES_MAPPING: &str = include_str!("../resources/es_movies_mapping.json");
const GENRES_MAPPING: &str = include_str!("../resources/es_genres_mapping.json");
const PERSONS_MAPPING: &str = include_str!("../resources/es_persons_mapping.json");

pub struct Loader {
    search: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").finish_non_exhaustive()
    }
}

impl Loader {
    pub fn new(search: Arc<dyn SearchBackend>) -> Self {
        Self { search }
    }

    /// Creates every index this pipeline writes to. Indices that already
    /// exist are left untouched.
    pub async fn ensure_indices(&self) -> Result<()> {
        self.search.create_index("movies", MOVIES_MAPPING).await?;
        self.search.create_index("genres", GENRES_MAPPING).await?;
        self.search.create_index("persons", PERSONS_MAPPING).await?;
        Ok(())
    }

    /// Upserts a batch keyed by document id; returns the number submitted.
    pub async fn bulk_load(&self, resource: &str, docs: &[(Uuid, Value)]) -> Result<usize> {
        if docs.is_empty() {
            debug!("Nothing to load into {}", resource);
            return Ok(0);
        }

        info!("Loading {} documents into {}", docs.len(), resource);
        self.search.bulk_index(resource, docs).await
    }
}
