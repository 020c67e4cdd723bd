//! Generic cache-then-backend lookup orchestration
//!
//! One [`LookupService`] covers every entity kind; the index name, search
//! field and document type resolve at compile time through
//! [`CatalogEntity`]. Each operation computes a deterministic cache key from
//! its parameters, consults the cache, falls back to the search backend on a
//! miss, and writes the result back with the configured TTL.
//!
//! The key grammar is part of the observable contract:
//!
//! - single entity:      `{id}`
//! - text search:        `{index}:{query}:{field}:{page_number}:{page_size}`
//! - unfiltered list:    `{index}:{page_number}:{page_size}`
//! - sorted list:        `{index}:{sort_field}:{sort_order}:{genre_id or "None"}:{page_number}:{page_size}`
//!
//! Cache failures degrade to backend-only behavior: a read error counts as a
//! miss and a write error is logged and swallowed. Backend failures always
//! propagate; they are never cached.

use std::marker::PhantomData;
use std::sync::Arc;

use cinema_search_core::{CatalogEntity, Page};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::composer::{sorted_list_body, SortKey};
use crate::search::{SearchBackend, SearchError};

/// Payload written for an absent single entity by earlier deployments.
/// Treated as a miss on read so a sentinel never shadows real data.
const EMPTY_SENTINEL: &str = "{}";

/// Cache-then-backend read orchestrator for one entity kind.
pub struct LookupService<E: CatalogEntity> {
    cache: Arc<dyn CacheStore>,
    backend: Arc<dyn SearchBackend>,
    cache_ttl_sec: u64,
    _entity: PhantomData<fn() -> E>,
}

impl<E: CatalogEntity> LookupService<E> {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        backend: Arc<dyn SearchBackend>,
        cache_ttl_sec: u64,
    ) -> Self {
        Self {
            cache,
            backend,
            cache_ttl_sec,
            _entity: PhantomData,
        }
    }

    /// Single-entity lookup, keyed by the raw id string.
    ///
    /// A confirmed not-found is returned as `Ok(None)` and is deliberately
    /// not cached: the next identical call asks the backend again, so a
    /// freshly synced document becomes visible without waiting out a
    /// negative-cache TTL.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<E>, SearchError> {
        let key = id.to_string();

        if let Some(entity) = self.cached_entity(&key).await {
            return Ok(Some(entity));
        }

        match self.backend.get_by_id(E::INDEX, id).await? {
            Some(doc) => {
                let entity: E = serde_json::from_value(doc)?;
                self.store(&key, &entity).await;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Fuzzy text search on the entity's search field.
    ///
    /// The possibly-empty result list is written through: a confirmed empty
    /// answer is itself cacheable.
    pub async fn get_by_search(&self, query: &str, page: Page) -> Result<Vec<E>, SearchError> {
        let key = format!(
            "{}:{}:{}:{}:{}",
            E::INDEX,
            query,
            E::SEARCH_FIELD,
            page.number,
            page.size
        );

        if let Some(list) = self.cached_list(&key).await {
            return Ok(list);
        }

        let docs = self
            .backend
            .search(E::INDEX, E::SEARCH_FIELD, query, page)
            .await?;
        let list = self.decode_list(docs)?;
        self.store(&key, &list).await;
        Ok(list)
    }

    /// Unfiltered paginated listing.
    pub async fn get_list(&self, page: Page) -> Result<Vec<E>, SearchError> {
        let key = format!("{}:{}:{}", E::INDEX, page.number, page.size);

        if let Some(list) = self.cached_list(&key).await {
            return Ok(list);
        }

        let docs = self.backend.query(E::INDEX, page, None).await?;
        let list = self.decode_list(docs)?;
        self.store(&key, &list).await;
        Ok(list)
    }

    /// Sorted, optionally genre-filtered listing.
    pub async fn get_sorted_list(
        &self,
        sort: SortKey,
        genre_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<E>, SearchError> {
        let key = format!(
            "{}:{}:{}:{}:{}:{}",
            E::INDEX,
            sort.field.as_str(),
            sort.order.as_str(),
            genre_id.map_or_else(|| "None".to_string(), |g| g.to_string()),
            page.number,
            page.size
        );

        if let Some(list) = self.cached_list(&key).await {
            return Ok(list);
        }

        let body = sorted_list_body(sort, genre_id);
        let docs = self.backend.query(E::INDEX, page, Some(body)).await?;
        let list = self.decode_list(docs)?;
        self.store(&key, &list).await;
        Ok(list)
    }

    /// One undecodable document fails the whole page: a thinned list must
    /// not be returned, and above all not cached for the TTL.
    fn decode_list(&self, docs: Vec<Value>) -> Result<Vec<E>, SearchError> {
        docs.into_iter()
            .map(|doc| serde_json::from_value::<E>(doc).map_err(SearchError::from))
            .collect()
    }

    async fn cached_entity(&self, key: &str) -> Option<E> {
        let payload = self.cached_payload(key).await?;
        match serde_json::from_str(&payload) {
            Ok(entity) => Some(entity),
            Err(err) => {
                warn!(key = %key, error = %err, "Undecodable cache payload, treating as miss");
                None
            }
        }
    }

    /// A non-empty payload decoding to `[]` is a hit: a confirmed-empty list
    /// is a valid cached answer and must not trigger another backend call.
    pub(crate) async fn cached_list(&self, key: &str) -> Option<Vec<E>> {
        let payload = self.cached_payload(key).await?;
        match serde_json::from_str(&payload) {
            Ok(list) => Some(list),
            Err(err) => {
                warn!(key = %key, error = %err, "Undecodable cache payload, treating as miss");
                None
            }
        }
    }

    async fn cached_payload(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(Some(payload)) if !payload.is_empty() && payload != EMPTY_SENTINEL => Some(payload),
            Ok(_) => None,
            Err(err) => {
                warn!(key = %key, error = %err, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write-through; never fails the surrounding read.
    pub(crate) async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to serialize cache payload");
                return;
            }
        };

        if let Err(err) = self.cache.set(key, &payload, self.cache_ttl_sec).await {
            warn!(key = %key, error = %err, "Cache write failed, continuing without caching");
        } else {
            debug!(key = %key, "Cache populated");
        }
    }
}
