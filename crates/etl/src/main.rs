//! ETL Service - Search index synchronization
//!
//! Periodically mirrors movies, genres and persons from PostgreSQL into
//! Elasticsearch so the read path always searches fresh documents.

use anyhow::Context;
use cinema_search_core::retry::{retry_with_backoff, RetryPolicy};
use cinema_search_etl::load::ElasticLoader;
use cinema_search_etl::{EtlConfig, SyncPipeline};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = EtlConfig::load()?;

    info!(
        interval_sec = config.sync.poll_interval_sec,
        chunk_size = config.sync.chunk_size,
        "Starting synchronization service"
    );

    // Connect-time failures are retried with exponential backoff; exhausting
    // the policy aborts startup.
    let pool = retry_with_backoff(
        || {
            PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
        },
        RetryPolicy::startup(),
        |_| true,
    )
    .await
    .context("Failed to connect to PostgreSQL")?;

    let loader = ElasticLoader::new(&config.elasticsearch.url);
    retry_with_backoff(|| loader.ping(), RetryPolicy::startup(), |_| true)
        .await
        .context("Failed to connect to Elasticsearch")?;

    SyncPipeline::new(pool, loader, &config).run().await;

    Ok(())
}
