use std::{collections::BTreeMap, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{GenreFilter, Movie, MovieId, MovieRecord},
};

/// In-memory movie table
///
/// Loaded once at startup. Movie ids are positions in `movies`, so the catalog
/// is append-free for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Catalog {
    movies: Vec<Movie>,
}

impl Catalog {
    /// Loads the catalog from a JSON dataset file
    ///
    /// A missing, unreadable, malformed or empty dataset is reported as
    /// `AppError::Dataset` naming the file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Dataset(format!("cannot read {}: {}", path.display(), e))
        })?;

        let records: Vec<MovieRecord> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Dataset(format!("malformed dataset {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_records(records).map_err(|e| match e {
            AppError::Dataset(msg) => AppError::Dataset(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        tracing::info!(
            path = %path.display(),
            movies = catalog.len(),
            genres = catalog.genres().len(),
            "Loaded movie catalog"
        );

        Ok(catalog)
    }

    /// Builds the catalog from already parsed records
    pub fn from_records(records: Vec<MovieRecord>) -> AppResult<Self> {
        if records.is_empty() {
            return Err(AppError::Dataset("dataset contains no movies".to_string()));
        }

        let movies = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let title = record.title.trim();
                if title.is_empty() {
                    return Err(AppError::Dataset(format!(
                        "record {} has a blank title",
                        index
                    )));
                }

                Ok(Movie {
                    id: MovieId(index),
                    title: title.to_string(),
                    genres: record.distinct_genres(),
                    tag_text: record.tag_text(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { movies })
    }

    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(id.index())
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Tag texts in catalog order, the corpus for the vectorizer
    pub fn tag_texts(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.tag_text.as_str())
    }

    /// Distinct genres across the catalog, sorted
    ///
    /// Genres differing only by case are reported once, spelled as first seen.
    pub fn genres(&self) -> Vec<String> {
        let mut genres: BTreeMap<String, String> = BTreeMap::new();
        for genre in self.movies.iter().flat_map(|m| m.genres.iter()) {
            genres
                .entry(genre.to_lowercase())
                .or_insert_with(|| genre.clone());
        }
        genres.into_values().collect()
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.movies.iter().any(|m| m.has_genre(genre))
    }

    /// Movies passing the filter, in catalog order
    pub fn browse(&self, filter: &GenreFilter, limit: usize) -> Vec<&Movie> {
        self.movies
            .iter()
            .filter(|m| filter.matches(m))
            .take(limit)
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_records_assigns_positional_ids() {
        let catalog = fixtures::sample_catalog();
        assert_eq!(catalog.len(), 8);
        for (index, movie) in catalog.movies().iter().enumerate() {
            assert_eq!(movie.id, MovieId(index));
        }
        assert_eq!(catalog.get(MovieId(0)).unwrap().title, "Titanic");
        assert!(catalog.get(MovieId(99)).is_none());
    }

    #[test]
    fn test_genres_sorted_and_distinct() {
        let catalog = fixtures::sample_catalog();
        assert_eq!(
            catalog.genres(),
            vec!["Action", "Adventure", "Comedy", "Drama", "Fantasy", "Romance", "Science Fiction"]
        );
        assert!(catalog.has_genre("comedy"));
        assert!(!catalog.has_genre("Western"));
    }

    #[test]
    fn test_browse_respects_filter_and_limit() {
        let catalog = fixtures::sample_catalog();
        let romance = catalog.browse(&GenreFilter::parse(Some("Romance")), 10);
        let titles: Vec<&str> = romance.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Titanic", "The Notebook"]);

        assert_eq!(catalog.browse(&GenreFilter::All, 3).len(), 3);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let err = Catalog::from_records(vec![]).unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let records: Vec<MovieRecord> =
            serde_json::from_str(r#"[{ "title": "Heat" }, { "title": "  " }]"#).unwrap();
        let err = Catalog::from_records(records).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "title": "Heat", "genres": ["Crime"], "tags": "heist" }}]"#).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies()[0].tag_text, "heist");
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = Catalog::load("/definitely/not/here/movies.json").unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));
        assert!(err.to_string().contains("/definitely/not/here/movies.json"));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = Catalog::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("malformed dataset"));
    }
}
