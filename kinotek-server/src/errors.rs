use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kinotek_core::CatalogError;
use serde_json::json;
use std::fmt;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.message }));
        (self.status, body).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => Self::unprocessable(msg),
            CatalogError::NotFound(what) => Self::not_found(format!("{what} not found")),
            CatalogError::SearchUnavailable(e) => {
                error!("Search backend failure: {}", e);
                Self::unavailable("search backend unavailable")
            }
            CatalogError::CacheUnavailable(e) => {
                error!("Cache failure surfaced to a read: {}", e);
                Self::unavailable("cache unavailable")
            }
            other => {
                error!("Unhandled service error: {}", other);
                Self::internal("internal server error")
            }
        }
    }
}
