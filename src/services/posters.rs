use std::{sync::Arc, time::Duration};

use crate::{
    db::{CacheKey, PosterCache},
    models::Poster,
    services::providers::PosterProvider,
};

/// Fetches posters through a provider, bounded by a timeout
///
/// The cache is owned by the caller and passed in by reference, so one cache
/// can outlive any number of fetchers.
#[derive(Clone)]
pub struct PosterFetcher {
    provider: Arc<dyn PosterProvider>,
    timeout: Duration,
}

impl PosterFetcher {
    pub fn new(provider: Arc<dyn PosterProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Returns the poster for `title`, consulting `cache` first
    ///
    /// On a miss the provider is asked exactly once; errors and timeouts are
    /// logged and cached as `Poster::Unavailable` for the rest of the process.
    pub async fn get_poster(&self, cache: &PosterCache, title: &str) -> Poster {
        let key = CacheKey::poster(title);
        cache
            .get_or_fetch(key, || async {
                tracing::debug!(title = %title, provider = self.provider.name(), "Poster cache miss");
                self.fetch(title).await
            })
            .await
    }

    async fn fetch(&self, title: &str) -> Poster {
        match tokio::time::timeout(self.timeout, self.provider.lookup_poster(title)).await {
            Ok(Ok(Some(url))) => Poster::Available { url },
            Ok(Ok(None)) => Poster::Unavailable,
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    title = %title,
                    provider = self.provider.name(),
                    "Poster lookup failed"
                );
                Poster::Unavailable
            }
            Err(_) => {
                tracing::warn!(
                    title = %title,
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Poster lookup timed out"
                );
                Poster::Unavailable
            }
        }
    }
}
