use std::sync::Arc;

use crate::{
    db::Catalog,
    error::{AppError, AppResult},
    models::{GenreFilter, Movie, ScoredMovie, TitleMatch},
    services::{
        similarity::SimilarityEngine,
        title_search::{ResolverConfig, TitleResolver},
        vectorizer::TfidfVectorizer,
    },
};

/// Adaptive cut-off relative to the head of the ranking
///
/// The threshold is the mean score of the best `pool` candidates scaled by
/// `ratio`, never lower than `minimum`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceFloor {
    pub pool: usize,
    pub ratio: f64,
    pub minimum: f64,
}

impl Default for RelevanceFloor {
    fn default() -> Self {
        Self {
            pool: 30,
            ratio: 0.8,
            minimum: 0.12,
        }
    }
}

impl RelevanceFloor {
    /// Score a candidate needs to survive; `ranked` must be sorted best first
    pub fn threshold(&self, ranked: &[ScoredMovie]) -> f64 {
        let head = &ranked[..ranked.len().min(self.pool)];
        if head.is_empty() {
            return self.minimum;
        }
        let mean = head.iter().map(|r| r.score).sum::<f64>() / head.len() as f64;
        (mean * self.ratio).max(self.minimum)
    }
}

/// A resolved query and its ranked neighbours
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub matched: TitleMatch,
    pub results: Vec<ScoredMovie>,
}

/// Generates content-based recommendations
///
/// Owns the immutable state fitted at startup: the catalog, the resolver over
/// its titles and the similarity engine over its vector space.
#[derive(Debug)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    resolver: TitleResolver,
    engine: SimilarityEngine,
    floor: Option<RelevanceFloor>,
}

impl Recommender {
    /// Fits the vector space over `catalog` and wires the components together
    pub fn build(
        catalog: Catalog,
        vectorizer: &TfidfVectorizer,
        resolver_config: ResolverConfig,
    ) -> AppResult<Self> {
        let catalog = Arc::new(catalog);
        let space = Arc::new(vectorizer.fit(catalog.tag_texts()));
        let engine = SimilarityEngine::new(catalog.clone(), space)?;
        let resolver = TitleResolver::new(&catalog, resolver_config);

        Ok(Self {
            catalog,
            resolver,
            engine,
            floor: None,
        })
    }

    /// Enables the adaptive relevance floor
    pub fn with_relevance_floor(mut self, floor: Option<RelevanceFloor>) -> Self {
        self.floor = floor;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    pub fn movie(&self, scored: &ScoredMovie) -> Option<&Movie> {
        self.catalog.get(scored.id)
    }

    /// Resolves a free-text query to a catalog movie
    pub fn resolve(&self, query: &str) -> Option<TitleMatch> {
        self.resolver.resolve(query)
    }

    /// Resolves `query` and ranks the `k` most similar movies
    ///
    /// An unresolvable query is `AppError::NotFound`; an empty candidate pool
    /// is an empty result.
    pub fn recommend_for_title(
        &self,
        query: &str,
        k: usize,
        genres: &GenreFilter,
    ) -> AppResult<Recommendations> {
        let matched = self
            .resolve(query)
            .ok_or_else(|| AppError::NotFound(format!("No movie matches '{}'", query.trim())))?;

        let results = match self.floor {
            None => self.engine.recommend(matched.id, k, genres),
            Some(floor) => {
                let mut ranked = self.engine.rank(matched.id, genres);
                let threshold = floor.threshold(&ranked);
                ranked.retain(|r| r.score >= threshold);
                ranked.truncate(k);
                ranked
            }
        };

        tracing::info!(
            query = %query,
            matched_id = %matched.id,
            match_score = matched.score,
            genres = %genres.label(),
            results = results.len(),
            "Recommendations generated"
        );

        Ok(Recommendations { matched, results })
    }

    /// Movies of the given genres in catalog order
    pub fn browse(&self, genres: &GenreFilter, limit: usize) -> Vec<&Movie> {
        self.catalog.browse(genres, limit)
    }
}
