//! Search port: typed document fetch, paginated listing, and structured
//! queries against a named index, plus the bulk-load path the ETL uses.

pub mod query;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CatalogError, Result};

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub size: u32,
    pub number: u32,
}

impl Page {
    pub fn new(size: u32, number: u32) -> Self {
        Self { size, number }
    }

    pub fn offset(&self) -> u32 {
        self.number.saturating_sub(1) * self.size
    }
}

/// Compiles the `[-]field` sort convention into a backend sort clause.
fn sort_clause(sort: &str) -> Value {
    let (field, order) = match sort.strip_prefix('-') {
        Some(field) => (field, "desc"),
        None => (sort, "asc"),
    };
    json!([{ field: { "order": order } }])
}

/// Operations against a named index. One implementation speaks to the real
/// backend; tests substitute their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetches a single document by id. Absent documents are `None`, not an
    /// error.
    async fn get(&self, resource: &str, id: Uuid) -> Result<Option<Value>>;

    /// Lists documents with no filter, paged and optionally sorted.
    async fn list<'a>(
        &self,
        resource: &str,
        page: Page,
        sort: Option<&'a str>,
    ) -> Result<Vec<Value>>;

    /// Single-field full-text match.
    async fn search_by_field<'a>(
        &self,
        resource: &str,
        field: &str,
        text: &str,
        page: Page,
        sort: Option<&'a str>,
    ) -> Result<Vec<Value>>;

    /// Structured query built with [`query`] combinators.
    async fn search_raw<'a>(
        &self,
        resource: &str,
        query: Value,
        page: Page,
        sort: Option<&'a str>,
    ) -> Result<Vec<Value>>;

    /// At-least-once upsert of many documents keyed by id. Returns the
    /// number of documents submitted.
    async fn bulk_index(&self, resource: &str, docs: &[(Uuid, Value)]) -> Result<usize>;

    /// Creates an index from a mapping blob; an already existing index is
    /// success, not an error.
    async fn create_index(&self, resource: &str, mapping: &str) -> Result<()>;
}

/// Elasticsearch over plain HTTP.
#[derive(Debug, Clone)]
pub struct ElasticSearch {
    http: reqwest::Client,
    base_url: String,
}

impl ElasticSearch {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_body(query: Value, page: Page, sort: Option<&str>) -> Value {
        let mut body = json!({
            "query": query,
            "size": page.size,
            "from": page.offset(),
        });
        if let Some(sort) = sort {
            body["sort"] = sort_clause(sort);
        }
        body
    }
}

#[async_trait]
impl SearchBackend for ElasticSearch {
    async fn get(&self, resource: &str, id: Uuid) -> Result<Option<Value>> {
        let url = format!("{}/{}/_doc/{}", self.base_url, resource, id);
        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let mut body: Value = response.error_for_status()?.json().await?;
        match body["_source"].take() {
            Value::Null => Ok(None),
            source => Ok(Some(source)),
        }
    }

    async fn list<'a>(
        &self,
        resource: &str,
        page: Page,
        sort: Option<&'a str>,
    ) -> Result<Vec<Value>> {
        self.search_raw(resource, query::match_all(), page, sort)
            .await
    }

    async fn search_by_field<'a>(
        &self,
        resource: &str,
        field: &str,
        text: &str,
        page: Page,
        sort: Option<&'a str>,
    ) -> Result<Vec<Value>> {
        self.search_raw(resource, query::field_match(field, text), page, sort)
            .await
    }

    async fn search_raw<'a>(
        &self,
        resource: &str,
        query: Value,
        page: Page,
        sort: Option<&'a str>,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/{}/_search", self.base_url, resource);
        let body = Self::search_body(query, page, sort);

        debug!("Search {}: {}", resource, body);

        let response = self.http.post(&url).json(&body).send().await?;
        let mut payload: Value = response.error_for_status()?.json().await?;

        match payload["hits"]["hits"].take() {
            Value::Array(hits) => Ok(hits
                .into_iter()
                .map(|mut hit| hit["_source"].take())
                .collect()),
            other => Err(CatalogError::Internal(format!(
                "malformed search response: expected hits array, got {other}"
            ))),
        }
    }

    async fn bulk_index(&self, resource: &str, docs: &[(Uuid, Value)]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let mut payload = String::new();
        for (id, doc) in docs {
            let action = json!({ "index": { "_index": resource, "_id": id } });
            payload.push_str(&action.to_string());
            payload.push('\n');
            payload.push_str(&doc.to_string());
            payload.push('\n');
        }

        let url = format!("{}/_bulk", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(payload)
            .send()
            .await?;

        let body: Value = response.error_for_status()?.json().await?;
        if body["errors"].as_bool().unwrap_or(false) {
            warn!("Bulk load into {} reported item errors: {}", resource, body);
        }

        Ok(docs.len())
    }

    async fn create_index(&self, resource: &str, mapping: &str) -> Result<()> {
        let url = format!("{}/{}", self.base_url, resource);
        let response = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(mapping.to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Created index {}", resource);
            return Ok(());
        }

        let body = response.text().await?;
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            debug!("Index {} already exists", resource);
            return Ok(());
        }

        Err(CatalogError::Internal(format!(
            "failed to create index {resource}: {status}: {body}"
        )))
    }
}
