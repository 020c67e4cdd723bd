//! # Cinema Search ETL
//!
//! Periodic synchronization pipeline keeping the search index current with
//! the relational store. Each pass extracts rows updated since the last
//! checkpoint, transforms them into the denormalized catalog documents, and
//! bulk-loads them into Elasticsearch, fully replacing each document.
//!
//! ## Modules
//!
//! - `extract`: incremental Postgres queries per index
//! - `transform`: rows into catalog documents (role fan-out, name lists)
//! - `load`: index bootstrap and `_bulk` NDJSON upserts
//! - `state`: JSON checkpoint file with per-index high-water marks
//! - `pipeline`: the polling loop tying the stages together
//! - `config`: environment-driven service configuration

pub mod config;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod state;
pub mod transform;

pub use config::EtlConfig;
pub use pipeline::SyncPipeline;

/// Common error type for the sync pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Elasticsearch returned status {status}: {body}")]
    Elasticsearch { status: u16, body: String },

    #[error("Bulk load reported item failures: {0}")]
    BulkRejected(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("State file error: {0}")]
    State(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
