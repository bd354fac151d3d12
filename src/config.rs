use serde::Deserialize;
use std::time::Duration;

use crate::services::title_search::ResolverConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the JSON movie catalog
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    /// OMDb API key; posters are disabled when absent
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Upper bound on a single poster lookup
    #[serde(default = "default_poster_timeout_secs")]
    pub poster_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the client does not ask for a count
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Hard cap on `k` and browse `limit`
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Longest accepted title query, counted after normalisation
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,

    /// Optional vocabulary cap for the TF-IDF fit
    #[serde(default)]
    pub max_features: Option<usize>,

    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    #[serde(default = "default_partial_match_threshold")]
    pub partial_match_threshold: f64,

    /// Drop weak matches relative to the top of the ranking
    #[serde(default)]
    pub relevance_floor: bool,
}

fn default_dataset_path() -> String {
    "data/movies.json".to_string()
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com".to_string()
}

fn default_poster_timeout_secs() -> u64 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_top_k() -> usize {
    10
}

fn default_max_top_k() -> usize {
    50
}

fn default_max_query_len() -> usize {
    200
}

fn default_match_threshold() -> f64 {
    80.0
}

fn default_partial_match_threshold() -> f64 {
    85.0
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn poster_timeout(&self) -> Duration {
        Duration::from_secs(self.poster_timeout_secs)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            match_threshold: self.match_threshold,
            partial_threshold: self.partial_match_threshold,
            ..ResolverConfig::default()
        }
    }
}
