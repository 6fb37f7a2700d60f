use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Movie, NewMovie, StreamingPlatform};

/// The shared movie cache. Append-only from the application's point of
/// view: records are inserted on first sight and never updated or deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>>;

    /// Fetches records for the given ids, in no particular order
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Movie>>;

    /// Inserts a record unless one already exists for the same catalog id,
    /// returning whichever row ends up in the cache. Concurrent first-sights
    /// of the same id resolve to the first committed writer.
    async fn insert_if_absent(&self, new: NewMovie) -> AppResult<Movie>;
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    tmdb_id: i64,
    title: String,
    overview: String,
    release_date: Option<NaiveDate>,
    genres: Json<Vec<String>>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: f64,
    vote_count: i64,
    runtime: i32,
    original_language: String,
    streaming_platforms: Json<Vec<StreamingPlatform>>,
    trailer_key: Option<String>,
    adult: bool,
    popularity: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            tmdb_id: row.tmdb_id,
            title: row.title,
            overview: row.overview,
            release_date: row.release_date,
            genres: row.genres.0,
            poster_path: row.poster_path,
            backdrop_path: row.backdrop_path,
            vote_average: row.vote_average,
            vote_count: row.vote_count,
            runtime: row.runtime,
            original_language: row.original_language,
            streaming_platforms: row.streaming_platforms.0,
            trailer_key: row.trailer_key,
            adult: row.adult,
            popularity: row.popularity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgMovieStore {
    pool: PgPool,
}

impl PgMovieStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn find_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>("SELECT * FROM movies WHERE tmdb_id = $1")
            .bind(tmdb_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Movie::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, MovieRow>("SELECT * FROM movies WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn insert_if_absent(&self, new: NewMovie) -> AppResult<Movie> {
        let movie = Movie::new(new);

        let inserted = sqlx::query_as::<_, MovieRow>(
            r#"
            INSERT INTO movies (
                id, tmdb_id, title, overview, release_date, genres,
                poster_path, backdrop_path, vote_average, vote_count, runtime,
                original_language, streaming_platforms, trailer_key, adult,
                popularity, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (tmdb_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(movie.id)
        .bind(movie.tmdb_id)
        .bind(&movie.title)
        .bind(&movie.overview)
        .bind(movie.release_date)
        .bind(Json(&movie.genres))
        .bind(&movie.poster_path)
        .bind(&movie.backdrop_path)
        .bind(movie.vote_average)
        .bind(movie.vote_count)
        .bind(movie.runtime)
        .bind(&movie.original_language)
        .bind(Json(&movie.streaming_platforms))
        .bind(&movie.trailer_key)
        .bind(movie.adult)
        .bind(movie.popularity)
        .bind(movie.created_at)
        .bind(movie.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(Movie::from(row));
        }

        // Lost the insert race; the winning row is authoritative.
        self.find_by_tmdb_id(movie.tmdb_id).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "Movie {} vanished between conflicting inserts",
                movie.tmdb_id
            ))
        })
    }
}
