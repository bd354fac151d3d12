//! Poster image providers
//!
//! Posters are cosmetic: a provider reports either a URL, "no poster" or an
//! error, and the fetcher in `services::posters` turns the latter two into
//! `Poster::Unavailable`.
use crate::error::AppResult;

pub mod omdb;

pub use omdb::OmdbProvider;

/// Trait for poster data providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Look up the poster URL for a movie title
    ///
    /// `Ok(None)` means the provider answered but has no poster for the title.
    async fn lookup_poster(&self, title: &str) -> AppResult<Option<String>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Provider used when no poster API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPosterProvider;

#[async_trait::async_trait]
impl PosterProvider for DisabledPosterProvider {
    async fn lookup_poster(&self, _title: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
