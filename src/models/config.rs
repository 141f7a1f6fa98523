//! Configuration model loaded from external sources.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::DUPLICATE_THRESHOLD;
use crate::domain::topic::TopicDefinition;

#[derive(Clone, Debug, Deserialize)]
/// Settings of the feed worker.
pub struct ServerConfig {
    pub database_url: String,
    pub zmq_address: String,
    /// YAML file listing feed sources and topic definitions.
    pub feeds_file: String,
    pub embedding_model: String,
    pub model_cache_dir: Option<String>,
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub duplicate_threshold: f32,
    /// Maximum number of earlier articles each article is compared with.
    pub candidate_pool_size: i64,
}

impl ServerConfig {
    /// Defaults, then `config/server.yaml` when present, then `FEEDS_*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config/server")
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_url", "app.db")?
            .set_default("zmq_address", "tcp://127.0.0.1:5555")?
            .set_default("feeds_file", "config/feeds.yaml")?
            .set_default("embedding_model", "all-minilm-l6-v2")?
            .set_default("fetch_timeout_secs", 30)?
            .set_default("fetch_concurrency", 5)?
            .set_default("duplicate_threshold", f64::from(DUPLICATE_THRESHOLD))?
            .set_default("candidate_pool_size", 500)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("FEEDS"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
/// A feed declared in the feeds file.
pub struct SourceConfig {
    pub name: String,
    pub feed_url: String,
    pub website_url: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
/// Feed sources and topic definitions synchronised into storage.
pub struct FeedsConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub topics: Vec<TopicDefinition>,
}

impl FeedsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}
