//! OMDb poster provider
//!
//! API Flow:
//! 1. Title lookup: GET /?t={title}&apikey={key} → movie details incl. `Poster`
//!
//! OMDb answers unknown titles with HTTP 200 and `"Response": "False"`, and
//! known titles without artwork with `"Poster": "N/A"`; both mean no poster.
use crate::{
    error::{AppError, AppResult},
    services::providers::PosterProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

/// Value OMDb uses for missing fields
const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

/// Subset of the OMDb title response we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbTitle {
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OmdbTitle {
    fn poster_url(self) -> Option<String> {
        if self.response.as_deref() == Some("False") {
            return None;
        }
        self.poster
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && p != NOT_AVAILABLE)
    }
}

impl OmdbProvider {
    /// Creates a provider whose requests give up after `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PosterProvider for OmdbProvider {
    async fn lookup_poster(&self, title: &str) -> AppResult<Option<String>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Poster title cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("t", title), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let details: OmdbTitle = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize OMDb response"
            );
            AppError::ExternalApi(format!("Failed to parse OMDb response: {}", e))
        })?;

        if let Some(reason) = details.error.as_deref() {
            tracing::debug!(title = %title, reason = %reason, provider = "omdb", "No OMDb match");
        }

        let poster = details.poster_url();

        tracing::info!(
            title = %title,
            found = poster.is_some(),
            provider = "omdb",
            "Poster lookup completed"
        );

        Ok(poster)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omdb_title_with_poster() {
        let json = r#"{
            "Title": "Titanic",
            "Year": "1997",
            "Poster": "https://m.media-amazon.com/images/titanic.jpg",
            "Response": "True"
        }"#;

        let details: OmdbTitle = serde_json::from_str(json).unwrap();
        assert_eq!(
            details.poster_url(),
            Some("https://m.media-amazon.com/images/titanic.jpg".to_string())
        );
    }

    #[test]
    fn test_omdb_title_poster_not_available() {
        let json = r#"{ "Title": "Obscure", "Poster": "N/A", "Response": "True" }"#;
        let details: OmdbTitle = serde_json::from_str(json).unwrap();
        assert_eq!(details.poster_url(), None);
    }

    #[test]
    fn test_omdb_movie_not_found() {
        let json = r#"{ "Response": "False", "Error": "Movie not found!" }"#;
        let details: OmdbTitle = serde_json::from_str(json).unwrap();
        assert_eq!(details.error.as_deref(), Some("Movie not found!"));
        assert_eq!(details.poster_url(), None);
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_url() {
        let provider = OmdbProvider::new(
            "key".to_string(),
            "http://www.omdbapi.com/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.api_url, "http://www.omdbapi.com");
        assert_eq!(provider.name(), "omdb");
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let provider = OmdbProvider::new(
            "key".to_string(),
            "http://test.local".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = provider.lookup_poster("  ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
