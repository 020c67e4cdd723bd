//! # Cinema Search Core
//!
//! Shared building blocks for the cinema-search services: the denormalized
//! entity documents served by the read path and written by the sync pipeline,
//! the pagination window, and the startup retry utility.
//!
//! ## Modules
//!
//! - `models`: Movie, Genre and Person documents plus the [`CatalogEntity`]
//!   binding between an entity type and its search index
//! - `page`: pagination window used by every list operation
//! - `retry`: exponential backoff retry utility for cold connections

pub mod models;
pub mod page;
pub mod retry;

pub use models::{CatalogEntity, Genre, Movie, MovieSummary, Person, PersonRef};
pub use page::Page;
pub use retry::{retry_with_backoff, RetryPolicy};
