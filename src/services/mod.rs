pub mod posters;
pub mod providers;
pub mod recommendations;
pub mod similarity;
pub mod title_search;
pub mod vectorizer;

pub use posters::PosterFetcher;
pub use recommendations::{Recommendations, Recommender, RelevanceFloor};
pub use similarity::SimilarityEngine;
pub use title_search::{ResolverConfig, TitleResolver};
pub use vectorizer::{TfidfVectorizer, VectorSpace};
