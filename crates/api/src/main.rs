//! API Service - Movie catalog search read path
//!
//! Serves cached movie/genre/person lookups backed by Elasticsearch, with
//! Redis as the side cache.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use cinema_search_api::{
    cache::{CacheStore, RedisCache},
    config::ApiConfig,
    search::{ElasticBackend, SearchBackend},
    server::{self, AppState},
    services::{GenreService, MovieService, PersonService},
};
use cinema_search_core::retry::{retry_with_backoff, RetryPolicy};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = Arc::new(ApiConfig::load()?);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    info!("Starting API service on {}", bind_addr);

    // Connect-time failures are retried with exponential backoff; exhausting
    // the policy aborts startup.
    let cache = retry_with_backoff(
        || RedisCache::connect(&config.cache.redis_url),
        RetryPolicy::startup(),
        |_| true,
    )
    .await
    .context("Failed to connect to Redis")?;

    let backend = retry_with_backoff(
        || ElasticBackend::connect(&config.elasticsearch.url),
        RetryPolicy::startup(),
        |_| true,
    )
    .await
    .context("Failed to connect to Elasticsearch")?;

    let cache: Arc<dyn CacheStore> = Arc::new(cache);
    let backend: Arc<dyn SearchBackend> = Arc::new(backend);

    let state = web::Data::new(AppState {
        config: config.clone(),
        movies: Arc::new(MovieService::new(
            cache.clone(),
            backend.clone(),
            config.cache.ttl_sec,
            config.catalog.popular_page_size,
        )),
        genres: Arc::new(GenreService::new(
            cache.clone(),
            backend.clone(),
            config.cache.ttl_sec,
        )),
        persons: Arc::new(PersonService::new(
            cache.clone(),
            backend.clone(),
            config.cache.ttl_sec,
        )),
    });

    let workers = config.server.workers;

    let mut http_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(server::configure_routes)
            .wrap(actix_web::middleware::Logger::default())
    })
    .bind(&bind_addr)?;

    if let Some(workers) = workers {
        http_server = http_server.workers(workers);
    }

    http_server.run().await?;

    Ok(())
}
