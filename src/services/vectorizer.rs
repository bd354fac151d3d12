//! TF-IDF fit over the catalog's tag text.
//!
//! The fit happens once at startup and produces an immutable [`VectorSpace`]:
//! a lexically ordered vocabulary, smoothed IDF weights and one L2-normalized
//! sparse vector per movie.

use std::collections::{BTreeMap, HashMap, HashSet};

use sprs::CsVec;

use crate::models::MovieId;

const MIN_TOKEN_LEN: usize = 2;

/// Configures and runs the TF-IDF fit
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    max_features: Option<usize>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the `max_features` most frequent terms of the corpus
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Fits the vocabulary and weights over `corpus`
    ///
    /// Documents keep their position, so the i-th vector belongs to the i-th
    /// document.
    pub fn fit<'a, I>(&self, corpus: I) -> VectorSpace
    where
        I: IntoIterator<Item = &'a str>,
    {
        let documents: Vec<Vec<String>> = corpus.into_iter().map(tokenize).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in &documents {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
            for token in tokens {
                *corpus_freq.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<&str> = doc_freq.keys().copied().collect();
        if let Some(max) = self.max_features {
            if terms.len() > max {
                terms.sort_by(|a, b| corpus_freq[b].cmp(&corpus_freq[a]).then_with(|| a.cmp(b)));
                terms.truncate(max);
            }
        }
        terms.sort_unstable();

        let n_docs = documents.len() as f64;
        let idf: Vec<f64> = terms
            .iter()
            .map(|term| ((1.0 + n_docs) / (1.0 + doc_freq[term] as f64)).ln() + 1.0)
            .collect();

        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(dim, term)| (term.to_string(), dim))
            .collect();

        let vectors: Vec<CsVec<f64>> = documents
            .iter()
            .map(|tokens| weigh(tokens, &vocabulary, &idf))
            .collect();
        let norms = vectors.iter().map(|v| v.dot(v).sqrt()).collect();

        tracing::info!(
            documents = documents.len(),
            vocabulary = vocabulary.len(),
            "Fitted TF-IDF vector space"
        );

        VectorSpace {
            vocabulary,
            idf,
            vectors,
            norms,
        }
    }
}

/// Builds one document's normalized TF-IDF vector
fn weigh(tokens: &[String], vocabulary: &HashMap<String, usize>, idf: &[f64]) -> CsVec<f64> {
    let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
    for token in tokens {
        if let Some(&dim) = vocabulary.get(token) {
            *counts.entry(dim).or_insert(0.0) += 1.0;
        }
    }

    let (indices, mut data): (Vec<usize>, Vec<f64>) = counts
        .into_iter()
        .map(|(dim, count)| (dim, count * idf[dim]))
        .unzip();

    let norm = data.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in &mut data {
            *weight /= norm;
        }
    }

    CsVec::new(vocabulary.len(), indices, data)
}

/// Lowercased alphanumeric tokens without stop words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an"
            | "the"
            | "and"
            | "or"
            | "but"
            | "of"
            | "in"
            | "on"
            | "at"
            | "to"
            | "for"
            | "by"
            | "with"
            | "from"
            | "as"
            | "is"
            | "are"
            | "was"
            | "were"
            | "be"
            | "been"
            | "it"
            | "its"
            | "his"
            | "her"
            | "he"
            | "she"
            | "they"
            | "their"
            | "them"
            | "who"
            | "which"
            | "that"
            | "this"
            | "into"
            | "after"
            | "when"
            | "while"
            | "must"
            | "has"
            | "have"
            | "not"
    )
}

/// Fitted vocabulary and per-document vectors
///
/// Immutable after the fit; adding documents means fitting again.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<CsVec<f64>>,
    norms: Vec<f64>,
}

impl VectorSpace {
    /// Number of document vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vocabulary size
    pub fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn dimension_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.dimension_of(term).map(|dim| self.idf[dim])
    }

    pub fn vector(&self, id: MovieId) -> Option<&CsVec<f64>> {
        self.vectors.get(id.index())
    }

    pub fn norm(&self, id: MovieId) -> Option<f64> {
        self.norms.get(id.index()).copied()
    }
}
