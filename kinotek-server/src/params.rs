//! Query parameter extraction with uniform validation.
//!
//! Malformed values (a non-numeric `page_size`, an out-of-range page, an
//! unknown sort) all answer with 422 and a field-level message, so the
//! deserialization rejection is folded into the same error as the range
//! checks.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::ApiError;

pub const MAX_PAGE_SIZE: u32 = 100;

const SORT_FIELDS: [&str; 2] = ["imdb_rating", "-imdb_rating"];

/// Checked query extractor: deserializes the query string, then runs the
/// parameter type's own validation. Both failure modes are 422.
#[derive(Debug, Clone, Copy)]
pub struct Valid<T>(pub T);

impl<S, T> FromRequestParts<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::try_from_uri(&parts.uri)
            .map_err(|e| ApiError::unprocessable(e.to_string()))?;
        params.validate().map_err(ApiError::unprocessable)?;
        Ok(Valid(params))
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn validate_page(page_size: u32, page_number: u32) -> Result<(), String> {
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        ));
    }
    if page_number < 1 {
        return Err(format!("page_number must be at least 1, got {page_number}"));
    }
    Ok(())
}

fn default_page_size() -> u32 {
    50
}

fn default_page_number() -> u32 {
    1
}

fn default_sort() -> String {
    "-imdb_rating".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilmListParams {
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default)]
    pub genre: Option<Uuid>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
}

impl Validate for FilmListParams {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.page_size, self.page_number)?;
        if !SORT_FIELDS.contains(&self.sort.as_str()) {
            return Err(format!("sort must be one of {SORT_FIELDS:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
}

impl Validate for SearchParams {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.page_size, self.page_number)?;
        if self.query.is_empty() {
            return Err("query must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
}

impl Validate for PageParams {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.page_size, self.page_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page_size: u32, page_number: u32) -> PageParams {
        PageParams {
            page_size,
            page_number,
        }
    }

    #[test]
    fn page_bounds_are_inclusive() {
        assert!(page(1, 1).validate().is_ok());
        assert!(page(100, 1).validate().is_ok());
        assert!(page(0, 1).validate().is_err());
        assert!(page(101, 1).validate().is_err());
        assert!(page(50, 0).validate().is_err());
    }

    #[test]
    fn film_list_rejects_unknown_sorts() {
        let mut params = FilmListParams {
            sort: "-imdb_rating".to_string(),
            genre: None,
            page_size: 50,
            page_number: 1,
        };
        assert!(params.validate().is_ok());

        params.sort = "imdb_rating".to_string();
        assert!(params.validate().is_ok());

        params.sort = "title".to_string();
        assert!(params.validate().is_err());

        params.sort = "-wrong_sort_param".to_string();
        assert!(params.validate().is_err());
    }

    #[test]
    fn search_requires_a_non_empty_query() {
        let params = SearchParams {
            query: String::new(),
            page_size: 50,
            page_number: 1,
        };
        assert!(params.validate().is_err());

        let params = SearchParams {
            query: "The Star".to_string(),
            ..params
        };
        assert!(params.validate().is_ok());
    }
}
