use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{GenreFilter, MatchMethod, Movie, MovieId, Poster, ALL_GENRES},
    services::title_search::normalize_title,
};

use super::{AppState, ResultLimits};

// Request/Response types

// Counts are taken as strings so malformed values get the JSON error body
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub q: Option<String>,
    /// Comma separated genre names
    pub genre: Option<String>,
    pub k: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PosterQuery {
    pub title: Option<String>,
}

/// One rendered result: title, similarity percentage and poster
#[derive(Debug, Serialize)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub similarity: Option<f64>,
    pub poster: Poster,
}

#[derive(Debug, Serialize)]
pub struct MatchedTitle {
    pub id: MovieId,
    pub title: String,
    pub score: f64,
    pub method: MatchMethod,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub matched: MatchedTitle,
    pub genre: String,
    pub results: Vec<MovieCard>,
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub genre: String,
    pub results: Vec<MovieCard>,
}

#[derive(Debug, Serialize)]
pub struct PosterResponse {
    pub title: String,
    pub poster: Poster,
}

/// Parses a requested result count, applying the default and the cap
fn result_count(requested: Option<&str>, limits: ResultLimits) -> AppResult<usize> {
    let raw = match requested.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw,
        None => return Ok(limits.default_k.min(limits.max_k)),
    };

    match raw.parse::<usize>() {
        Ok(0) => Err(AppError::InvalidInput(
            "Result count must be at least 1".to_string(),
        )),
        Ok(k) => Ok(k.min(limits.max_k)),
        Err(_) => Err(AppError::InvalidInput(format!(
            "Result count must be a positive integer, got '{}'",
            raw
        ))),
    }
}

/// Trims free text and rejects it when blank or longer than `max_len` once normalised
fn title_text(raw: Option<String>, field: &str, max_len: usize) -> AppResult<String> {
    let text = raw.unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Err(AppError::InvalidInput(format!("{} cannot be empty", field)));
    }
    if normalize_title(&text).chars().count() > max_len {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(text)
}

async fn card(state: &AppState, movie: &Movie, similarity: Option<f64>) -> MovieCard {
    let poster = state
        .posters
        .get_poster(&state.poster_cache, &movie.title)
        .await;

    MovieCard {
        id: movie.id,
        title: movie.title.clone(),
        genres: movie.genres.clone(),
        similarity,
        poster,
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "movies": state.recommender.catalog().len()
        })),
    )
}

/// Genre choices: "All Genres" followed by every catalog genre
pub async fn get_genres(State(state): State<AppState>) -> Json<GenresResponse> {
    let mut genres = vec![ALL_GENRES.to_string()];
    genres.extend(state.recommender.catalog().genres());
    Json(GenresResponse { genres })
}

/// Recommend movies similar to the queried title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let query = title_text(params.q, "Search query", state.limits.max_query_len)?;
    let k = result_count(params.k.as_deref(), state.limits)?;
    let genres = GenreFilter::parse(params.genre.as_deref());

    tracing::info!(
        request_id = %request_id,
        query = %query,
        k = k,
        genres = %genres.label(),
        "Processing recommendation request"
    );

    // Resolution and ranking are CPU bound
    let recommender = state.recommender.clone();
    let task_query = query.clone();
    let task_genres = genres.clone();
    let recommendations = tokio::task::spawn_blocking(move || {
        recommender.recommend_for_title(&task_query, k, &task_genres)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Recommendation task failed: {}", e)))??;

    let matched_movie = state
        .recommender
        .catalog()
        .get(recommendations.matched.id)
        .ok_or_else(|| AppError::Internal("Resolved movie missing from catalog".to_string()))?;

    let state = &state;
    let results = join_all(recommendations.results.iter().filter_map(|scored| {
        state
            .recommender
            .movie(scored)
            .map(|movie| card(state, movie, Some(scored.percentage())))
    }))
    .await;

    Ok(Json(RecommendationResponse {
        query,
        matched: MatchedTitle {
            id: matched_movie.id,
            title: matched_movie.title.clone(),
            score: recommendations.matched.score,
            method: recommendations.matched.method,
        },
        genre: genres.label(),
        results,
    }))
}

/// Browse one genre in catalog order
pub async fn browse_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(params): Query<BrowseQuery>,
) -> AppResult<Json<BrowseResponse>> {
    let limit = result_count(params.limit.as_deref(), state.limits)?;
    let filter = GenreFilter::any_of([genre.as_str()]);

    if !filter.is_all() && !state.recommender.catalog().has_genre(genre.trim()) {
        return Err(AppError::NotFound(format!("Unknown genre '{}'", genre.trim())));
    }

    let movies = state.recommender.browse(&filter, limit);
    let state = &state;
    let results = join_all(movies.into_iter().map(|movie| card(state, movie, None))).await;

    Ok(Json(BrowseResponse {
        genre: filter.label(),
        results,
    }))
}

/// Poster lookup for a catalog movie through the shared cache
///
/// Titles that resolve to no catalog movie are rejected before any provider
/// call, so the cache holds at most one entry per catalog title.
pub async fn get_poster(
    State(state): State<AppState>,
    Query(params): Query<PosterQuery>,
) -> AppResult<Json<PosterResponse>> {
    let title = title_text(params.title, "Title", state.limits.max_query_len)?;

    let matched = state
        .recommender
        .resolve(&title)
        .ok_or_else(|| AppError::NotFound(format!("No movie matches '{}'", title)))?;
    let movie = state
        .recommender
        .catalog()
        .get(matched.id)
        .ok_or_else(|| AppError::Internal("Resolved movie missing from catalog".to_string()))?;

    let poster = state.posters.get_poster(&state.poster_cache, &movie.title).await;
    Ok(Json(PosterResponse {
        title: movie.title.clone(),
        poster,
    }))
}
