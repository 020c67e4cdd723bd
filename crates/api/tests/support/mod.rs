//! Shared test doubles: an in-memory cache, a cache that always fails, and a
//! search backend mock with a call counter and programmable failure point.

#![allow(dead_code)]

use async_trait::async_trait;
use cinema_search_api::cache::{CacheError, CacheStore};
use cinema_search_api::search::{SearchBackend, SearchError};
use cinema_search_core::Page;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory [`CacheStore`] that ignores TTLs and exposes its entries for
/// key-grammar assertions.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, payload: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, payload: &str, _ttl_sec: u64) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// [`CacheStore`] whose every operation fails, for degradation tests.
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Operation("cache is down".to_string()))
    }

    async fn set(&self, _key: &str, _payload: &str, _ttl_sec: u64) -> Result<(), CacheError> {
        Err(CacheError::Operation("cache is down".to_string()))
    }
}

/// [`SearchBackend`] mock over in-memory document sets.
///
/// Counts every call, so tests can assert that cache hits skip the backend.
/// `fail_from(n)` makes the n-th call (zero-based) and every later one fail
/// with a 503-shaped error, which drives the mid-fan-out failure tests.
pub struct MockBackend {
    calls: AtomicUsize,
    fail_from: AtomicUsize,
    docs: Mutex<HashMap<String, Vec<Value>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_from: AtomicUsize::new(usize::MAX),
            docs: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_docs(index: &str, docs: Vec<Value>) -> Self {
        let backend = Self::new();
        backend.insert(index, docs);
        backend
    }

    pub fn insert(&self, index: &str, docs: Vec<Value>) {
        self.docs
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_from(&self, call: usize) {
        self.fail_from.store(call, Ordering::SeqCst);
    }

    fn tick(&self) -> Result<(), SearchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_from.load(Ordering::SeqCst) {
            Err(SearchError::Status {
                status: 503,
                body: "mock backend unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn index_docs(&self, index: &str) -> Vec<Value> {
        self.docs
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }
}

fn window(docs: Vec<Value>, page: Page) -> Vec<Value> {
    docs.into_iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .collect()
}

fn rating_of(doc: &Value) -> f64 {
    doc["imdb_rating"].as_f64().unwrap_or(f64::NEG_INFINITY)
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn get_by_id(&self, index: &str, id: Uuid) -> Result<Option<Value>, SearchError> {
        self.tick()?;
        let wanted = id.to_string();
        Ok(self
            .index_docs(index)
            .into_iter()
            .find(|doc| doc["id"] == Value::String(wanted.clone())))
    }

    async fn search(
        &self,
        index: &str,
        field: &str,
        text: &str,
        page: Page,
    ) -> Result<Vec<Value>, SearchError> {
        self.tick()?;
        let needle = text.to_lowercase();
        let matches = self
            .index_docs(index)
            .into_iter()
            .filter(|doc| {
                doc[field]
                    .as_str()
                    .map(|value| value.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect();
        Ok(window(matches, page))
    }

    async fn query(
        &self,
        index: &str,
        page: Page,
        body: Option<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        self.tick()?;
        let mut docs = self.index_docs(index);

        if let Some(body) = body {
            if let Some(genre_id) = body["query"]["nested"]["query"]["term"]["genres.id"].as_str() {
                docs.retain(|doc| {
                    doc["genres"]
                        .as_array()
                        .map(|genres| genres.iter().any(|g| g["id"] == Value::String(genre_id.to_string())))
                        .unwrap_or(false)
                });
            }

            if let Some(order) = body["sort"]["imdb_rating"].as_str() {
                docs.sort_by(|a, b| {
                    rating_of(a)
                        .partial_cmp(&rating_of(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                if order == "desc" {
                    docs.reverse();
                }
            }
        }

        Ok(window(docs, page))
    }
}

/// Build a complete movie document for the mock index.
pub fn movie_doc(id: Uuid, title: &str, rating: Option<f64>, genres: &[(Uuid, &str)]) -> Value {
    json!({
        "id": id.to_string(),
        "title": title,
        "imdb_rating": rating,
        "type": "movie",
        "creation_date": null,
        "file_path": null,
        "description": null,
        "genres": genres
            .iter()
            .map(|(genre_id, name)| json!({
                "id": genre_id.to_string(),
                "name": name,
                "description": null,
            }))
            .collect::<Vec<_>>(),
        "directors": [],
        "actors": [],
        "writers": [],
        "directors_names": [],
        "actors_names": [],
        "writers_names": [],
    })
}

pub fn genre_doc(id: Uuid, name: &str) -> Value {
    json!({
        "id": id.to_string(),
        "name": name,
        "description": null,
    })
}

pub fn person_doc(id: Uuid, full_name: &str, roles: &[&str]) -> Value {
    json!({
        "id": id.to_string(),
        "full_name": full_name,
        "roles": roles,
        "movies_ids": [],
    })
}
