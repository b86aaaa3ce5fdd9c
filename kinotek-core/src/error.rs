use thiserror::Error;

/// Error taxonomy shared by the query services and the ETL.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(#[from] redis::RedisError),

    #[error("search backend unavailable: {0}")]
    SearchUnavailable(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("source database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Whether the ETL should retry the failed operation. Connection-level
    /// failures against any backend are transient; everything else is a
    /// programming or data error and must surface.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::CacheUnavailable(_)
                | CatalogError::SearchUnavailable(_)
                | CatalogError::Database(_)
                | CatalogError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
