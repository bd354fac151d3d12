use std::sync::Arc;

use crate::{
    config::Config,
    db::{Catalog, PosterCache},
    error::AppResult,
    services::{
        providers::{DisabledPosterProvider, OmdbProvider, PosterProvider},
        PosterFetcher, Recommender, RelevanceFloor, TfidfVectorizer,
    },
};

/// Bounds applied to client supplied counts and text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimits {
    pub default_k: usize,
    pub max_k: usize,
    pub max_query_len: usize,
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self {
            default_k: 10,
            max_k: 50,
            max_query_len: 200,
        }
    }
}

/// Shared application state
///
/// Everything but the poster cache is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub posters: PosterFetcher,
    pub poster_cache: Arc<PosterCache>,
    pub limits: ResultLimits,
}

impl AppState {
    pub fn new(recommender: Recommender, posters: PosterFetcher, limits: ResultLimits) -> Self {
        Self {
            recommender: Arc::new(recommender),
            posters,
            poster_cache: Arc::new(PosterCache::new()),
            limits,
        }
    }

    /// Loads the catalog, fits the model and picks a poster provider
    ///
    /// Fails when the dataset cannot be loaded; the server must not start
    /// without a vector space.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let catalog = Catalog::load(&config.dataset_path)?;

        let vectorizer = TfidfVectorizer::new().with_max_features(config.max_features);
        let floor = config.relevance_floor.then(RelevanceFloor::default);
        let recommender = Recommender::build(catalog, &vectorizer, config.resolver_config())?
            .with_relevance_floor(floor);

        let provider: Arc<dyn PosterProvider> = match config.omdb_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Arc::new(OmdbProvider::new(
                key.trim().to_string(),
                config.omdb_api_url.clone(),
                config.poster_timeout(),
            )?),
            _ => {
                tracing::warn!("OMDB_API_KEY not set, posters disabled");
                Arc::new(DisabledPosterProvider)
            }
        };

        let limits = ResultLimits {
            default_k: config.default_top_k.max(1),
            max_k: config.max_top_k.max(1),
            max_query_len: config.max_query_len.max(1),
        };

        tracing::info!(
            provider = provider.name(),
            default_k = limits.default_k,
            max_k = limits.max_k,
            relevance_floor = config.relevance_floor,
            "Application state initialised"
        );

        Ok(Self::new(
            recommender,
            PosterFetcher::new(provider, config.poster_timeout()),
            limits,
        ))
    }
}
