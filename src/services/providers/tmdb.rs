/// TMDB catalog provider
///
/// Thin request/response mapping over the TMDB v3 API. Browse/search
/// responses are cached in Redis under per-query keys; detail responses are
/// not cached here because the resolver persists them into the movie cache.
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{GenreEntry, MovieDetails, MovieListPage, TimeWindow},
    services::providers::CatalogClient,
};
use async_trait::async_trait;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const LIST_CACHE_TTL: u64 = 3600; // 1 hour
const GENRE_LIST_CACHE_TTL: u64 = 86400; // 1 day

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbClient {
    /// Creates a TMDB client with an explicit timeout budget for catalog
    /// calls; a timed-out call surfaces as an upstream transport failure.
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            cache,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[derive(Deserialize)]
struct GenreListResponse {
    genres: Vec<GenreEntry>,
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<MovieListPage> {
        if query.trim().is_empty() {
            return Err(AppError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search {
                query: query.to_string(),
                page,
            },
            SEARCH_CACHE_TTL,
            async move {
                let results: MovieListPage = self
                    .get_json(
                        "/search/movie",
                        &[
                            ("query", query.to_string()),
                            ("page", page.to_string()),
                            ("include_adult", "false".to_string()),
                        ],
                    )
                    .await?;

                tracing::info!(
                    query = %query,
                    results = results.results.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(results)
            }
        )
    }

    async fn movie_details(&self, tmdb_id: i64) -> AppResult<MovieDetails> {
        let details: MovieDetails = self
            .get_json(
                &format!("/movie/{}", tmdb_id),
                &[("append_to_response", "videos".to_string())],
            )
            .await?;

        tracing::debug!(tmdb_id, provider = "tmdb", "Movie details fetched");

        Ok(details)
    }

    async fn trending(&self, window: TimeWindow) -> AppResult<MovieListPage> {
        cached!(
            self.cache,
            CacheKey::Trending(window.to_string()),
            LIST_CACHE_TTL,
            async move {
                self.get_json(&format!("/trending/movie/{}", window), &[])
                    .await
            }
        )
    }

    async fn popular(&self, page: u32) -> AppResult<MovieListPage> {
        cached!(
            self.cache,
            CacheKey::Popular(page),
            LIST_CACHE_TTL,
            async move {
                self.get_json("/movie/popular", &[("page", page.to_string())])
                    .await
            }
        )
    }

    async fn top_rated(&self, page: u32) -> AppResult<MovieListPage> {
        cached!(
            self.cache,
            CacheKey::TopRated(page),
            LIST_CACHE_TTL,
            async move {
                self.get_json("/movie/top_rated", &[("page", page.to_string())])
                    .await
            }
        )
    }

    async fn by_genre(&self, genre_id: i64, page: u32) -> AppResult<MovieListPage> {
        cached!(
            self.cache,
            CacheKey::Genre { genre_id, page },
            LIST_CACHE_TTL,
            async move {
                self.get_json(
                    "/discover/movie",
                    &[
                        ("with_genres", genre_id.to_string()),
                        ("page", page.to_string()),
                        ("sort_by", "popularity.desc".to_string()),
                    ],
                )
                .await
            }
        )
    }

    async fn similar(&self, tmdb_id: i64, page: u32) -> AppResult<MovieListPage> {
        cached!(
            self.cache,
            CacheKey::Similar { tmdb_id, page },
            LIST_CACHE_TTL,
            async move {
                self.get_json(
                    &format!("/movie/{}/similar", tmdb_id),
                    &[("page", page.to_string())],
                )
                .await
            }
        )
    }

    async fn recommended_for(&self, tmdb_id: i64, page: u32) -> AppResult<MovieListPage> {
        cached!(
            self.cache,
            CacheKey::Recommended { tmdb_id, page },
            LIST_CACHE_TTL,
            async move {
                self.get_json(
                    &format!("/movie/{}/recommendations", tmdb_id),
                    &[("page", page.to_string())],
                )
                .await
            }
        )
    }

    async fn genre_list(&self) -> AppResult<Vec<GenreEntry>> {
        cached!(
            self.cache,
            CacheKey::GenreList,
            GENRE_LIST_CACHE_TTL,
            async move {
                let response: GenreListResponse = self.get_json("/genre/movie/list", &[]).await?;
                Ok::<_, AppError>(response.genres)
            }
        )
    }
}
