//! On-demand cosine ranking.
//!
//! Each query scores the target movie against every other movie in O(N·D).
//! No pairwise matrix is ever materialized.

use std::sync::Arc;

use sprs::CsVec;

use crate::{
    db::Catalog,
    error::{AppError, AppResult},
    models::{GenreFilter, MovieId, ScoredMovie},
    services::vectorizer::VectorSpace,
};

/// Cosine similarity, 0 when either vector has zero magnitude
pub fn cosine_similarity(a: &CsVec<f64>, b: &CsVec<f64>) -> f64 {
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    cosine_with_norms(a, norm_a, b, norm_b)
}

fn cosine_with_norms(a: &CsVec<f64>, norm_a: f64, b: &CsVec<f64>, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Ranks catalog movies by similarity to a target movie
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    catalog: Arc<Catalog>,
    space: Arc<VectorSpace>,
}

impl SimilarityEngine {
    /// Pairs a catalog with the vector space fitted over it
    pub fn new(catalog: Arc<Catalog>, space: Arc<VectorSpace>) -> AppResult<Self> {
        if catalog.len() != space.len() {
            return Err(AppError::Internal(format!(
                "vector space has {} vectors for {} movies",
                space.len(),
                catalog.len()
            )));
        }
        Ok(Self { catalog, space })
    }

    /// Cosine similarity between two catalog movies, 0 for unknown ids
    pub fn similarity(&self, a: MovieId, b: MovieId) -> f64 {
        match (
            self.space.vector(a).zip(self.space.norm(a)),
            self.space.vector(b).zip(self.space.norm(b)),
        ) {
            (Some((va, na)), Some((vb, nb))) => cosine_with_norms(va, na, vb, nb),
            _ => 0.0,
        }
    }

    /// Every candidate passing `genres`, best first
    ///
    /// The target itself is never a candidate. Equal scores keep catalog order.
    pub fn rank(&self, target: MovieId, genres: &GenreFilter) -> Vec<ScoredMovie> {
        let Some((target_vec, target_norm)) =
            self.space.vector(target).zip(self.space.norm(target))
        else {
            return Vec::new();
        };

        let mut ranked: Vec<ScoredMovie> = self
            .catalog
            .movies()
            .iter()
            .filter(|movie| movie.id != target && genres.matches(movie))
            .filter_map(|movie| {
                let vector = self.space.vector(movie.id)?;
                let norm = self.space.norm(movie.id)?;
                Some(ScoredMovie {
                    id: movie.id,
                    score: cosine_with_norms(target_vec, target_norm, vector, norm),
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        ranked
    }

    /// Top `k` candidates for `target`
    pub fn recommend(&self, target: MovieId, k: usize, genres: &GenreFilter) -> Vec<ScoredMovie> {
        let mut ranked = self.rank(target, genres);
        ranked.truncate(k);

        tracing::debug!(
            target = %target,
            k = k,
            genres = %genres.label(),
            returned = ranked.len(),
            "Similarity ranking completed"
        );

        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::catalog::fixtures::sample_catalog, models::MovieRecord, services::TfidfVectorizer};

    fn engine_for(catalog: Catalog) -> SimilarityEngine {
        let space = TfidfVectorizer::new().fit(catalog.tag_texts());
        SimilarityEngine::new(Arc::new(catalog), Arc::new(space)).unwrap()
    }

    fn catalog_from(json: &str) -> Catalog {
        let records: Vec<MovieRecord> = serde_json::from_str(json).unwrap();
        Catalog::from_records(records).unwrap()
    }

    fn titles(engine: &SimilarityEngine, results: &[ScoredMovie]) -> Vec<String> {
        results
            .iter()
            .map(|r| engine.catalog.get(r.id).unwrap().title.clone())
            .collect()
    }

    #[test]
    fn test_cosine_zero_magnitude_is_zero() {
        let a = CsVec::new(3, vec![0, 2], vec![1.0, 2.0]);
        let zero: CsVec<f64> = CsVec::new(3, vec![], vec![]);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_of_parallel_vectors_is_one() {
        let a = CsVec::new(3, vec![0, 2], vec![1.0, 2.0]);
        let b = CsVec::new(3, vec![0, 2], vec![2.0, 4.0]);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_of_disjoint_vectors_is_zero() {
        let a = CsVec::new(4, vec![0, 1], vec![1.0, 1.0]);
        let b = CsVec::new(4, vec![2, 3], vec![1.0, 1.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_recommend_never_includes_target() {
        let engine = engine_for(sample_catalog());
        for movie in engine.catalog.movies() {
            let results = engine.recommend(movie.id, 20, &GenreFilter::All);
            assert!(results.iter().all(|r| r.id != movie.id));
            assert_eq!(results.len(), engine.catalog.len() - 1);
        }
    }

    #[test]
    fn test_results_sorted_descending_within_bounds() {
        let engine = engine_for(sample_catalog());
        for movie in engine.catalog.movies() {
            let results = engine.recommend(movie.id, 10, &GenreFilter::All);
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
            for result in &results {
                assert!((0.0..=100.0).contains(&result.percentage()));
            }
        }
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let engine = engine_for(sample_catalog());
        let n = engine.catalog.len();
        for a in 0..n {
            for b in 0..n {
                let ab = engine.similarity(MovieId(a), MovieId(b));
                let ba = engine.similarity(MovieId(b), MovieId(a));
                assert!((ab - ba).abs() < 1e-12, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_closest_sequel_ranks_first() {
        let engine = engine_for(sample_catalog());
        let results = engine.recommend(MovieId(1), 3, &GenreFilter::All);
        assert_eq!(titles(&engine, &results)[0], "The Matrix Reloaded");

        let results = engine.recommend(MovieId(6), 1, &GenreFilter::All);
        assert_eq!(
            titles(&engine, &results),
            vec!["Harry Potter and the Chamber of Secrets"]
        );
    }

    #[test]
    fn test_k_limits_results() {
        let engine = engine_for(sample_catalog());
        assert_eq!(engine.recommend(MovieId(0), 3, &GenreFilter::All).len(), 3);
        assert!(engine.recommend(MovieId(0), 0, &GenreFilter::All).is_empty());
    }

    #[test]
    fn test_genre_filter_restricts_candidates() {
        let engine = engine_for(catalog_from(
            r#"[
                { "title": "A", "genres": ["Action"], "tags": "explosion chase hero" },
                { "title": "B", "genres": ["Action", "Drama"], "tags": "explosion chase family" },
                { "title": "C", "genres": ["Comedy"], "tags": "party friends" }
            ]"#,
        ));

        let filter = GenreFilter::any_of(["Comedy"]);
        let results = engine.recommend(MovieId(0), 5, &filter);
        assert_eq!(titles(&engine, &results), vec!["C"]);
        assert_eq!(results[0].score, 0.0);
    }

    #[test]
    fn test_empty_candidate_pool_returns_empty() {
        let engine = engine_for(sample_catalog());
        let filter = GenreFilter::any_of(["Western"]);
        assert!(engine.recommend(MovieId(0), 5, &filter).is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let engine = engine_for(catalog_from(
            r#"[
                { "title": "Original", "tags": "heist crew vault" },
                { "title": "Copy One", "tags": "heist crew vault" },
                { "title": "Unrelated", "tags": "dragon castle" },
                { "title": "Copy Two", "tags": "heist crew vault" }
            ]"#,
        ));
        let results = engine.recommend(MovieId(0), 3, &GenreFilter::All);
        assert_eq!(titles(&engine, &results), vec!["Copy One", "Copy Two", "Unrelated"]);
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let engine = engine_for(sample_catalog());
        let first = engine.recommend(MovieId(4), 5, &GenreFilter::All);
        let second = engine.recommend(MovieId(4), 5, &GenreFilter::All);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_target_returns_empty() {
        let engine = engine_for(sample_catalog());
        assert!(engine.recommend(MovieId(999), 5, &GenreFilter::All).is_empty());
    }

    #[test]
    fn test_mismatched_space_is_rejected() {
        let catalog = sample_catalog();
        let space = TfidfVectorizer::new().fit(vec!["only one document"]);
        let err = SimilarityEngine::new(Arc::new(catalog), Arc::new(space)).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
