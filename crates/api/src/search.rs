//! Elasticsearch read client
//!
//! Speaks the Elasticsearch REST API directly: `GET /{index}/_doc/{id}` for
//! point lookups and `POST /{index}/_search` for everything else. Documents
//! come back as raw `serde_json::Value` sources; the lookup layer owns
//! decoding them into entities.
//!
//! "Not found" and "empty result" are valid answers (`Ok(None)` / empty vec),
//! never errors. A transport failure or a non-success HTTP status is a
//! [`SearchError`] and propagates to the caller untouched.

use async_trait::async_trait;
use cinema_search_core::Page;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Error types for search backend operations.
///
/// A document that exists but does not decode into its entity type is
/// `Decode`, not a miss: only the sync pipeline writes documents, so a
/// malformed one is a data defect to surface, never a "not found".
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Document store queried by id, fuzzy text match, or structured body.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetch a single document by id. `Ok(None)` when the index has no such
    /// document.
    async fn get_by_id(&self, index: &str, id: Uuid) -> Result<Option<Value>, SearchError>;

    /// Fuzzy full-text match on one field, ordered by relevance score.
    async fn search(
        &self,
        index: &str,
        field: &str,
        text: &str,
        page: Page,
    ) -> Result<Vec<Value>, SearchError>;

    /// Paginated listing, optionally constrained and sorted by a structured
    /// body produced by the query composer.
    async fn query(
        &self,
        index: &str,
        page: Page,
        body: Option<Value>,
    ) -> Result<Vec<Value>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct DocResponse {
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

/// Elasticsearch-backed [`SearchBackend`] over a shared HTTP client.
#[derive(Clone)]
pub struct ElasticBackend {
    client: reqwest::Client,
    base_url: String,
}

impl ElasticBackend {
    /// Connect to Elasticsearch and verify the cluster answers.
    ///
    /// Called once at startup, under the bounded-retry connect policy.
    #[instrument(skip_all, fields(elasticsearch_url = %base_url))]
    pub async fn connect(base_url: &str) -> Result<Self, SearchError> {
        info!("Connecting to Elasticsearch");

        let backend = Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        let response = backend.client.get(&backend.base_url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        info!("Elasticsearch connection established");
        Ok(backend)
    }

    async fn run_search(&self, index: &str, body: Value) -> Result<Vec<Value>, SearchError> {
        let url = format!("{}/{}/_search", self.base_url, index);
        debug!(index = %index, body = %body, "Executing search request");

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn get_by_id(&self, index: &str, id: Uuid) -> Result<Option<Value>, SearchError> {
        let url = format!("{}/{}/_doc/{}", self.base_url, index, id);

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(index = %index, id = %id, "Document not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SearchError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let doc: DocResponse = response.json().await?;
        if doc.found {
            Ok(doc.source)
        } else {
            Ok(None)
        }
    }

    async fn search(
        &self,
        index: &str,
        field: &str,
        text: &str,
        page: Page,
    ) -> Result<Vec<Value>, SearchError> {
        let body = json!({
            "from": page.offset(),
            "size": page.size,
            "query": {
                "match": {
                    field: {
                        "query": text,
                        "fuzziness": "auto",
                    }
                }
            }
        });

        self.run_search(index, body).await
    }

    async fn query(
        &self,
        index: &str,
        page: Page,
        body: Option<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        let mut request = serde_json::Map::new();
        request.insert("from".to_string(), json!(page.offset()));
        request.insert("size".to_string(), json!(page.size));

        // The window and the composed body are disjoint top-level keys, so a
        // shallow merge is a plain insert.
        if let Some(Value::Object(extra)) = body {
            for (key, value) in extra {
                request.insert(key, value);
            }
        }

        self.run_search(index, Value::Object(request)).await
    }
}
