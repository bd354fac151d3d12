pub mod cache;
pub mod catalog;

pub use cache::CacheKey;
pub use cache::PosterCache;
pub use catalog::Catalog;
