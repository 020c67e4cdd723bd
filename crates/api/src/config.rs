use serde::{Deserialize, Serialize};

/// API service configuration.
///
/// Loaded once at startup from an optional `config/api` file overlaid with
/// `CINEMA`-prefixed environment variables (`CINEMA_SERVER__PORT` and so on).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis cache configuration
    #[serde(default)]
    pub cache: CacheSettings,

    /// Elasticsearch configuration
    #[serde(default)]
    pub elasticsearch: ElasticSettings,

    /// Catalog read-path configuration
    #[serde(default)]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    /// Worker threads; actix's default when unset
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Redis connection URL
    pub redis_url: String,

    /// TTL for every cache entry (seconds)
    pub ttl_sec: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            ttl_sec: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticSettings {
    /// Elasticsearch base URL
    pub url: String,
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// Page size applied when the client does not supply one
    pub default_page_size: u32,

    /// Fixed page size for popular-in-genre and the similar-movies fan-out
    pub popular_page_size: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            popular_page_size: 20,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment and config file.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/api").required(false))
            .add_source(config::Environment::with_prefix("CINEMA").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cache: CacheSettings::default(),
            elasticsearch: ElasticSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}
