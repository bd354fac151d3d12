//! Fuzzy resolution of a free-text query to a catalog title.
//!
//! Resolution runs in three passes over normalized titles: exact match, then
//! the best weighted ratio above `match_threshold`, then the best partial
//! (substring window) ratio above `partial_threshold`. Scores are 0-100 and
//! equal scores resolve to the earlier catalog entry.

use strsim::normalized_levenshtein;

use crate::{
    db::Catalog,
    models::{MatchMethod, MovieId, TitleMatch},
};

/// Thresholds controlling how forgiving resolution is
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Minimum weighted ratio for a fuzzy match
    pub match_threshold: f64,
    /// Minimum partial ratio for the substring pass
    pub partial_threshold: f64,
    /// Queries shorter than this never take the substring pass
    pub min_partial_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            match_threshold: 80.0,
            partial_threshold: 85.0,
            min_partial_len: 3,
        }
    }
}

/// Maps user queries to catalog movies
#[derive(Debug, Clone)]
pub struct TitleResolver {
    titles: Vec<String>,
    config: ResolverConfig,
}

impl TitleResolver {
    pub fn new(catalog: &Catalog, config: ResolverConfig) -> Self {
        Self {
            titles: catalog
                .movies()
                .iter()
                .map(|m| normalize_title(&m.title))
                .collect(),
            config,
        }
    }

    /// Finds the catalog movie best matching `query`
    ///
    /// Returns `None` for blank queries and for queries whose best match falls
    /// below the configured thresholds.
    pub fn resolve(&self, query: &str) -> Option<TitleMatch> {
        let query = normalize_title(query);
        if query.is_empty() {
            return None;
        }

        if let Some(index) = self.titles.iter().position(|t| *t == query) {
            return Some(TitleMatch {
                id: MovieId(index),
                score: 100.0,
                method: MatchMethod::Exact,
            });
        }

        if let Some((index, score)) = self.best_by(|title| weighted_ratio(&query, title)) {
            if score >= self.config.match_threshold {
                tracing::debug!(query = %query, title = %self.titles[index], score, "Fuzzy title match");
                return Some(TitleMatch {
                    id: MovieId(index),
                    score,
                    method: MatchMethod::Fuzzy,
                });
            }
        }

        if query.chars().count() >= self.config.min_partial_len {
            if let Some((index, score)) = self.best_by(|title| partial_ratio(&query, title)) {
                if score >= self.config.partial_threshold {
                    tracing::debug!(query = %query, title = %self.titles[index], score, "Partial title match");
                    return Some(TitleMatch {
                        id: MovieId(index),
                        score,
                        method: MatchMethod::Partial,
                    });
                }
            }
        }

        tracing::debug!(query = %query, "No title above threshold");
        None
    }

    /// Highest scoring title, first one wins on ties
    fn best_by<F>(&self, score: F) -> Option<(usize, f64)>
    where
        F: Fn(&str) -> f64,
    {
        let mut best: Option<(usize, f64)> = None;
        for (index, title) in self.titles.iter().enumerate() {
            let s = score(title.as_str());
            if best.map_or(true, |(_, top)| s > top) {
                best = Some((index, s));
            }
        }
        best
    }
}

/// Lowercases, turns punctuation into spaces and collapses whitespace
pub fn normalize_title(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized Levenshtein similarity, 0-100
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Ratio after sorting the words of both strings
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best ratio of the shorter string against every same-length window of the longer
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    if short_len == long_chars.len() {
        return ratio(short, long);
    }

    let mut best = 0.0f64;
    for window in long_chars.windows(short_len) {
        let window: String = window.iter().collect();
        best = best.max(ratio(short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Blend of whole-string, token-order-insensitive and substring similarity
///
/// The substring score only counts when one string is at least 1.5x longer,
/// and is discounted further as the length gap grows.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let base = ratio(a, b);
    let length_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;

    if length_ratio < 1.5 {
        return base.max(token_sort_ratio(a, b) * 0.95);
    }

    let scale = if length_ratio < 8.0 { 0.9 } else { 0.6 };
    base.max(token_sort_ratio(a, b) * 0.95 * scale)
        .max(partial_ratio(a, b) * scale)
}
