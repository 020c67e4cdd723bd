//! # Cinema Search API
//!
//! Read path of the movie catalog: every lookup goes cache first, falls back
//! to the search index on a miss, and repopulates the cache with a fixed TTL.
//! A served result may therefore be stale by up to that TTL; the sync
//! pipeline (the `cinema-search-etl` crate) is the only writer of documents.
//!
//! ## Modules
//!
//! - `cache`: TTL key/value side cache over Redis
//! - `search`: Elasticsearch read client behind the [`SearchBackend`] seam
//! - `composer`: structured sort/filter query bodies
//! - `lookup`: generic cache-then-backend orchestration per entity kind
//! - `services`: movie/genre/person services, similarity and popularity
//! - `handlers` / `server`: HTTP surface
//! - `config`: environment-driven service configuration

pub mod cache;
pub mod composer;
pub mod config;
pub mod handlers;
pub mod lookup;
pub mod search;
pub mod server;
pub mod services;

pub use cache::{CacheError, CacheStore, RedisCache};
pub use composer::{SortKey, SortOrder};
pub use config::ApiConfig;
pub use lookup::LookupService;
pub use search::{ElasticBackend, SearchBackend, SearchError};
pub use server::AppState;
pub use services::{GenreService, MovieService, PersonService};
