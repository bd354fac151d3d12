use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::MovieId;

/// Label used by clients for "no genre restriction"
pub const ALL_GENRES: &str = "All Genres";

/// A movie in the catalog
///
/// Built once when the catalog is loaded and never mutated afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Movie {
    /// Position in the catalog
    pub id: MovieId,
    pub title: String,
    /// Distinct genres, in the order the dataset lists them
    pub genres: Vec<String>,
    /// Text blob fed to the vectorizer
    #[serde(skip)]
    pub tag_text: String,
}

impl Movie {
    /// Case-insensitive genre membership
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// One row of the on-disk dataset
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Precomputed tag text; wins over the composed one when non-blank
    #[serde(default)]
    pub tags: Option<String>,
}

/// Only the leading cast members carry signal
const CAST_LIMIT: usize = 3;

impl MovieRecord {
    /// Builds the tag text for this record
    ///
    /// Multi-word genres, keywords and names are squashed into a single token
    /// ("Science Fiction" becomes "ScienceFiction") so they act as one feature.
    pub fn tag_text(&self) -> String {
        if let Some(tags) = self.tags.as_deref().filter(|t| !t.trim().is_empty()) {
            return tags.trim().to_string();
        }

        let mut parts = Vec::new();
        if let Some(overview) = self.overview.as_deref() {
            parts.push(overview.trim().to_string());
        }
        parts.extend(self.genres.iter().map(|g| squash(g)));
        parts.extend(self.keywords.iter().map(|k| squash(k)));
        parts.extend(self.cast.iter().take(CAST_LIMIT).map(|c| squash(c)));
        if let Some(director) = self.director.as_deref() {
            parts.push(squash(director));
        }

        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Genres trimmed and de-duplicated case-insensitively
    pub fn distinct_genres(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .filter(|g| seen.insert(g.to_lowercase()))
            .map(str::to_string)
            .collect()
    }
}

fn squash(phrase: &str) -> String {
    phrase.split_whitespace().collect()
}

/// Restricts the candidate pool of a recommendation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenreFilter {
    /// No restriction
    #[default]
    All,
    /// Candidates must share at least one of these (lowercased) genres
    AnyOf(BTreeSet<String>),
}

impl GenreFilter {
    /// Builds a filter from genre names
    ///
    /// An empty list, or one naming "All Genres", means no restriction.
    pub fn any_of<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for genre in genres {
            let genre = genre.as_ref().trim();
            if genre.eq_ignore_ascii_case(ALL_GENRES) {
                return GenreFilter::All;
            }
            if !genre.is_empty() {
                set.insert(genre.to_lowercase());
            }
        }

        if set.is_empty() {
            GenreFilter::All
        } else {
            GenreFilter::AnyOf(set)
        }
    }

    /// Parses a comma separated query parameter
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => Self::any_of(raw.split(',')),
            None => GenreFilter::All,
        }
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::AnyOf(set) => movie.genres.iter().any(|g| set.contains(&g.to_lowercase())),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, GenreFilter::All)
    }

    /// Human-readable label, "All Genres" when unrestricted
    pub fn label(&self) -> String {
        match self {
            GenreFilter::All => ALL_GENRES.to_string(),
            GenreFilter::AnyOf(set) => set.iter().cloned().collect::<Vec<_>>().join(","),
        }
    }
}
