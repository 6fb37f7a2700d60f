use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{GenreEntry, Movie, MovieListPage, TimeWindow},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/trending", get(trending))
        .route("/popular", get(popular))
        .route("/top-rated", get(top_rated))
        .route("/genres", get(genre_list))
        .route("/genre/:genre_id", get(by_genre))
        .route("/:tmdb_id", get(details))
        .route("/:tmdb_id/similar", get(similar))
        .route("/:tmdb_id/recommendations", get(recommended))
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub window: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<MovieListPage>> {
    let results = state.catalog.search_movies(&params.query, params.page).await?;
    Ok(Json(results))
}

/// Read-through detail lookup: serves the cached record, fetching and
/// caching it from the catalog on first sight
async fn details(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
) -> AppResult<Json<Movie>> {
    let movie = state.resolver.resolve_tmdb_id(tmdb_id).await?;
    Ok(Json(movie))
}

async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<MovieListPage>> {
    let window = match params.window.as_deref() {
        Some(value) => TimeWindow::parse(value)?,
        None => TimeWindow::Week,
    };
    let results = state.catalog.trending(window).await?;
    Ok(Json(results))
}

async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<MovieListPage>> {
    let results = state.catalog.popular(params.page).await?;
    Ok(Json(results))
}

async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<MovieListPage>> {
    let results = state.catalog.top_rated(params.page).await?;
    Ok(Json(results))
}

async fn by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<MovieListPage>> {
    let results = state.catalog.by_genre(genre_id, params.page).await?;
    Ok(Json(results))
}

async fn genre_list(State(state): State<AppState>) -> AppResult<Json<Vec<GenreEntry>>> {
    let genres = state.catalog.genre_list().await?;
    Ok(Json(genres))
}

async fn similar(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<MovieListPage>> {
    let results = state.catalog.similar(tmdb_id, params.page).await?;
    Ok(Json(results))
}

async fn recommended(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<MovieListPage>> {
    let results = state.catalog.recommended_for(tmdb_id, params.page).await?;
    Ok(Json(results))
}
