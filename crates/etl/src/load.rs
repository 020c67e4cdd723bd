//! Search index loading
//!
//! Creates the target indices with their ru_en analyzer mappings when they do
//! not exist yet, and writes transformed documents through the `_bulk` API as
//! NDJSON. A bulk response with the `errors` flag set is treated as a failed
//! chunk so the checkpoint does not advance past it.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::info;

use cinema_search_core::CatalogEntity;
use uuid::Uuid;

use crate::{EtlError, Result};

fn index_settings() -> Value {
    json!({
        "refresh_interval": "1s",
        "analysis": {
            "filter": {
                "english_stop": {"type": "stop", "stopwords": "_english_"},
                "english_stemmer": {"type": "stemmer", "language": "english"},
                "english_possessive_stemmer": {
                    "type": "stemmer",
                    "language": "possessive_english"
                },
                "russian_stop": {"type": "stop", "stopwords": "_russian_"},
                "russian_stemmer": {"type": "stemmer", "language": "russian"}
            },
            "analyzer": {
                "ru_en": {
                    "tokenizer": "standard",
                    "filter": [
                        "lowercase",
                        "english_stop",
                        "english_stemmer",
                        "english_possessive_stemmer",
                        "russian_stop",
                        "russian_stemmer"
                    ]
                }
            }
        }
    })
}

fn person_ref_mapping() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": {"type": "keyword"},
            "full_name": {"type": "text", "analyzer": "ru_en"}
        }
    })
}

fn movies_mappings() -> Value {
    json!({
        "dynamic": "strict",
        "properties": {
            "id": {"type": "keyword"},
            "imdb_rating": {"type": "float"},
            "type": {"type": "keyword"},
            "creation_date": {"type": "date", "format": "yyyy-MM-dd"},
            "genres": {
                "type": "nested",
                "dynamic": "strict",
                "properties": {
                    "id": {"type": "keyword"},
                    "name": {"type": "text", "analyzer": "ru_en"},
                    "description": {"type": "text", "analyzer": "ru_en"}
                }
            },
            "title": {
                "type": "text",
                "analyzer": "ru_en",
                "fields": {"raw": {"type": "keyword"}}
            },
            "file_path": {"type": "keyword"},
            "description": {"type": "text", "analyzer": "ru_en"},
            "directors_names": {"type": "text", "analyzer": "ru_en"},
            "actors_names": {"type": "text", "analyzer": "ru_en"},
            "writers_names": {"type": "text", "analyzer": "ru_en"},
            "directors": person_ref_mapping(),
            "actors": person_ref_mapping(),
            "writers": person_ref_mapping()
        }
    })
}

fn genres_mappings() -> Value {
    json!({
        "dynamic": "strict",
        "properties": {
            "id": {"type": "keyword"},
            "name": {"type": "keyword"},
            "description": {"type": "text", "analyzer": "ru_en"}
        }
    })
}

fn persons_mappings() -> Value {
    json!({
        "dynamic": "strict",
        "properties": {
            "id": {"type": "keyword"},
            "full_name": {
                "type": "text",
                "analyzer": "ru_en",
                "fields": {"raw": {"type": "keyword"}}
            },
            "roles": {"type": "keyword"},
            "movies_ids": {"type": "keyword"}
        }
    })
}

/// Full creation body for a known index name.
pub fn index_body(index: &str) -> Result<Value> {
    let mappings = match index {
        "movies" => movies_mappings(),
        "genres" => genres_mappings(),
        "persons" => persons_mappings(),
        other => {
            return Err(EtlError::InvalidDocument(format!(
                "no mappings defined for index {other:?}"
            )))
        }
    };
    Ok(json!({"settings": index_settings(), "mappings": mappings}))
}

/// Serializes documents into the NDJSON payload the `_bulk` endpoint takes.
pub fn bulk_payload<E: CatalogEntity>(documents: &[(Uuid, E)]) -> Result<String> {
    let mut payload = String::new();
    for (id, document) in documents {
        let action = json!({"index": {"_index": E::INDEX, "_id": id}});
        payload.push_str(&serde_json::to_string(&action)?);
        payload.push('\n');
        payload.push_str(&serde_json::to_string(document)?);
        payload.push('\n');
    }
    Ok(payload)
}

pub struct ElasticLoader {
    client: Client,
    base_url: String,
}

impl ElasticLoader {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Pings the cluster root, failing on any non-success status.
    pub async fn ping(&self) -> Result<()> {
        let response = self.client.get(&self.base_url).send().await?;
        if !response.status().is_success() {
            return Err(EtlError::Elasticsearch {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Creates the index with its mappings unless it already exists.
    pub async fn ensure_index(&self, index: &str) -> Result<()> {
        let url = format!("{}/{index}", self.base_url);
        let response = self.client.head(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let response = self.client.put(&url).json(&index_body(index)?).send().await?;
                if !response.status().is_success() {
                    return Err(EtlError::Elasticsearch {
                        status: response.status().as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    });
                }
                info!(index, "created search index");
                Ok(())
            }
            status => Err(EtlError::Elasticsearch {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Indexes a chunk of documents through `_bulk`.
    pub async fn load<E: CatalogEntity>(&self, documents: &[(Uuid, E)]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let payload = bulk_payload(documents)?;
        let response = self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .header("content-type", "application/x-ndjson")
            .body(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EtlError::Elasticsearch {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body: Value = response.json().await?;
        if body["errors"].as_bool().unwrap_or(false) {
            return Err(EtlError::BulkRejected(body.to_string()));
        }
        info!(index = E::INDEX, count = documents.len(), "indexed documents");
        Ok(())
    }
}
