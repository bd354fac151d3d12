use std::{collections::HashMap, fmt::Display, future::Future, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

use crate::models::Poster;

/// Key of a poster cache entry
///
/// Titles differing only by case or surrounding whitespace share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn poster(title: &str) -> Self {
        Self(title.trim().to_lowercase())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "poster:{}", self.0)
    }
}

/// Process-lifetime poster cache
///
/// Each key owns a once-cell, so concurrent callers asking for the same title
/// wait on a single lookup instead of issuing their own. Failed lookups are
/// stored like successful ones and are never retried.
#[derive(Debug, Default)]
pub struct PosterCache {
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<Poster>>>>,
}

impl PosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached poster without triggering a lookup
    pub async fn get(&self, key: &CacheKey) -> Option<Poster> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Returns the cached poster, running `fetch` on the first request for `key`
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> Poster
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Poster>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(key).or_default().clone()
        };

        cell.get_or_init(fetch).await.clone()
    }

    /// Number of settled entries
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn poster(url: &str) -> Poster {
        Poster::Available {
            url: url.to_string(),
        }
    }

    #[test]
    fn test_cache_key_display() {
        assert_eq!(format!("{}", CacheKey::poster("Titanic")), "poster:titanic");
    }

    #[test]
    fn test_cache_key_normalizes_case_and_whitespace() {
        assert_eq!(CacheKey::poster("  THE MATRIX "), CacheKey::poster("the matrix"));
    }

    #[tokio::test]
    async fn test_cache_miss_then_hit() {
        let cache = PosterCache::new();
        let key = CacheKey::poster("Titanic");
        assert_eq!(cache.get(&key).await, None);

        let first = cache
            .get_or_fetch(key.clone(), || async { poster("https://img/titanic.jpg") })
            .await;
        let second = cache
            .get_or_fetch(key.clone(), || async { poster("https://img/other.jpg") })
            .await;

        assert_eq!(first, second);
        assert_eq!(cache.get(&key).await, Some(poster("https://img/titanic.jpg")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_unavailable_is_cached() {
        let cache = PosterCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = cache
                .get_or_fetch(CacheKey::poster("Lost Film"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Poster::Unavailable
                })
                .await;
            assert_eq!(result, Poster::Unavailable);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let cache = Arc::new(PosterCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(CacheKey::poster("Avatar"), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        poster("https://img/avatar.jpg")
                    })
                    .await
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), poster("https://img/avatar.jpg"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
