use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod movie;

pub use movie::{GenreFilter, Movie, MovieRecord, ALL_GENRES};

/// Stable index of a movie in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub usize);

impl MovieId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Title resolution
// ============================================================================

/// How a query was matched to a catalog title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Partial,
}

/// Outcome of a successful title resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleMatch {
    pub id: MovieId,
    /// Similarity between query and title, 0-100
    pub score: f64,
    pub method: MatchMethod,
}

// ============================================================================
// Similarity results
// ============================================================================

/// A candidate movie and its cosine similarity to the query movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMovie {
    pub id: MovieId,
    /// Raw cosine similarity in [0, 1]
    pub score: f64,
}

impl ScoredMovie {
    /// Similarity as a percentage rounded to two decimals
    pub fn percentage(&self) -> f64 {
        to_percentage(self.score)
    }
}

pub fn to_percentage(score: f64) -> f64 {
    ((score * 100.0).clamp(0.0, 100.0) * 100.0).round() / 100.0
}

// ============================================================================
// Posters
// ============================================================================

/// Result of a poster lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Poster {
    Available { url: String },
    Unavailable,
}

impl Poster {
    pub fn url(&self) -> Option<&str> {
        match self {
            Poster::Available { url } => Some(url),
            Poster::Unavailable => None,
        }
    }
}
