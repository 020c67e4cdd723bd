use serde::{Deserialize, Serialize};

/// ETL service configuration.
///
/// Loaded once at startup from an optional `config/etl` file overlaid with
/// `CINEMA_ETL`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub elasticsearch: ElasticConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/movies".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticConfig {
    /// Elasticsearch base URL
    pub url: String,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Rows fetched per extraction chunk
    pub chunk_size: i64,

    /// Seconds between synchronization passes
    pub poll_interval_sec: u64,

    /// Checkpoint file path
    pub state_file: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            poll_interval_sec: 60,
            state_file: "sync_state.json".to_string(),
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            elasticsearch: ElasticConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Load configuration from environment and config file.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/etl").required(false))
            .add_source(config::Environment::with_prefix("CINEMA_ETL").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
