//! Read-side services: query composition plus read-through caching.
//!
//! All three services share the same policy: consult the cache, treat cache
//! failures and undecodable entries as misses, fall through to the search
//! backend, and repopulate the cache on the way out. Backend failures are
//! returned to the caller; there is no stale fallback.

pub mod film;
pub mod genre;
pub mod person;

pub use film::FilmService;
pub use genre::GenreService;
pub use person::PersonService;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::cache::CacheStore;

/// TTL for single-document cache entries.
pub(crate) const ITEM_TTL: Duration = Duration::from_secs(300);
/// TTL for list-shaped cache entries. Tunable; 60 s is the default.
pub(crate) const LIST_TTL: Duration = Duration::from_secs(60);

/// Reads and decodes a cache entry. Both a backend failure and a poisoned
/// entry degrade to a miss; the subsequent `store` overwrites the poison.
pub(crate) async fn cached<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    let bytes = match cache.get(key).await {
        Ok(bytes) => bytes?,
        Err(e) => {
            warn!("Cache read for {} failed, treating as miss: {}", key, e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Poisoned cache entry at {}, refetching: {}", key, e);
            None
        }
    }
}

/// Serializes and stores a cache entry; a failing cache is a no-op.
pub(crate) async fn store<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to serialize cache entry for {}: {}", key, e);
            return;
        }
    };

    if let Err(e) = cache.set(key, &bytes, ttl).await {
        warn!("Cache write for {} failed, continuing: {}", key, e);
    }
}
