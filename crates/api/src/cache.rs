//! Redis side cache for lookup results
//!
//! The cache stores serialized entities and entity lists under the key
//! grammar owned by the lookup layer, each entry expiring after the
//! configured TTL. There is no explicit invalidation: entries lapse and are
//! lazily repopulated on the next miss.
//!
//! A read failure is equivalent to a miss and a write failure never fails the
//! surrounding lookup; both policies live in the lookup layer, which owns
//! payload typing. This module only moves strings in and out of Redis.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::{debug, info, instrument};

/// Error types for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Cache operation failed: {0}")]
    Operation(String),
}

/// Key/value store with per-entry expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the payload stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `payload` under `key`, expiring after `ttl_sec` seconds.
    async fn set(&self, key: &str, payload: &str, ttl_sec: u64) -> Result<(), CacheError>;
}

/// Redis-backed [`CacheStore`] over a shared connection manager.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis and verify the connection with a PING.
    ///
    /// Called once at startup, under the bounded-retry connect policy.
    #[instrument(skip_all, fields(redis_url = %redis_url))]
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(CacheError::Operation(format!(
                "unexpected PING reply: {pong}"
            )));
        }

        info!("Redis connection established");
        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;

        match &value {
            Some(_) => debug!(key = %key, "Cache hit"),
            None => debug!(key = %key, "Cache miss"),
        }

        Ok(value)
    }

    async fn set(&self, key: &str, payload: &str, ttl_sec: u64) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let _: () = conn.set_ex(key, payload, ttl_sec).await?;

        debug!(key = %key, ttl = %ttl_sec, "Cache set");
        Ok(())
    }
}
