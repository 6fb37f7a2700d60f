//! Upstream service clients.
//!
//! Both externals sit behind traits so the orchestration pipeline can be
//! exercised against mocks: the movie catalog (search, details, browse
//! lists) and the text-completion service. Either client failing surfaces
//! as an upstream error distinguishable from "no result".

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{GenreEntry, MovieDetails, MovieListPage, TimeWindow},
};

pub mod groq;
pub mod tmdb;

pub use groq::GroqClient;
pub use tmdb::TmdbClient;

/// Read-only view of the upstream movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Full-text search, ranked by the catalog's own relevance
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<MovieListPage>;

    /// Full record for a known catalog id, with attached videos
    async fn movie_details(&self, tmdb_id: i64) -> AppResult<MovieDetails>;

    async fn trending(&self, window: TimeWindow) -> AppResult<MovieListPage>;
    async fn popular(&self, page: u32) -> AppResult<MovieListPage>;
    async fn top_rated(&self, page: u32) -> AppResult<MovieListPage>;
    async fn by_genre(&self, genre_id: i64, page: u32) -> AppResult<MovieListPage>;
    async fn similar(&self, tmdb_id: i64, page: u32) -> AppResult<MovieListPage>;
    async fn recommended_for(&self, tmdb_id: i64, page: u32) -> AppResult<MovieListPage>;
    async fn genre_list(&self) -> AppResult<Vec<GenreEntry>>;
}

/// A system/user prompt pair plus sampling parameters for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-completion service. One call, one raw response; no streaming, no
/// tool use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String>;

    /// Model identifier recorded on persisted recommendations
    fn model_id(&self) -> &str;
}
