//! Core of the kinotek film catalog: the cache and search ports, the query
//! DSL spoken to the search backend, and the read-side services composing
//! both into cached typed lookups.
//!
//! The write side (the ETL) reuses the same search port for index creation
//! and bulk loading, so every interaction with the backend goes through one
//! seam.

pub mod cache;
pub mod error;
pub mod search;
pub mod services;

pub use cache::{CacheStore, RedisCache};
pub use error::{CatalogError, Result};
pub use search::{ElasticSearch, Page, SearchBackend};
pub use services::{FilmService, GenreService, PersonService};
