use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{StatusCounts, WatchHistoryEntry, WatchStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchHistoryStore: Send + Sync {
    async fn create(&self, entry: &WatchHistoryEntry) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WatchHistoryEntry>>;
    async fn find_by_user_and_movie(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> AppResult<Option<WatchHistoryEntry>>;

    /// A user's entries, newest first, optionally filtered by status
    async fn list(
        &self,
        user_id: Uuid,
        status: Option<WatchStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<WatchHistoryEntry>>;

    async fn count(&self, user_id: Uuid, status: Option<WatchStatus>) -> AppResult<i64>;

    /// Per-status and favorite totals in one round trip
    async fn status_counts(&self, user_id: Uuid) -> AppResult<StatusCounts>;

    /// Every watched entry, for runtime/genre aggregation
    async fn list_watched(&self, user_id: Uuid) -> AppResult<Vec<WatchHistoryEntry>>;

    async fn update(&self, entry: &WatchHistoryEntry) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(sqlx::FromRow)]
struct WatchHistoryRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    status: String,
    user_rating: Option<i16>,
    review: Option<String>,
    watched_at: Option<DateTime<Utc>>,
    is_favorite: bool,
    rewatch_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WatchHistoryRow> for WatchHistoryEntry {
    type Error = AppError;

    fn try_from(row: WatchHistoryRow) -> Result<Self, Self::Error> {
        let status = WatchStatus::parse(&row.status)
            .map_err(|_| AppError::Internal(format!("Unknown watch status '{}'", row.status)))?;
        Ok(WatchHistoryEntry {
            id: row.id,
            user_id: row.user_id,
            movie_id: row.movie_id,
            status,
            user_rating: row.user_rating,
            review: row.review,
            watched_at: row.watched_at,
            is_favorite: row.is_favorite,
            rewatch_count: row.rewatch_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatusCountsRow {
    watchlist: i64,
    watching: i64,
    watched: i64,
    favorites: i64,
}

#[derive(Clone)]
pub struct PgWatchHistoryStore {
    pool: PgPool,
}

impl PgWatchHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchHistoryStore for PgWatchHistoryStore {
    async fn create(&self, entry: &WatchHistoryEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO watch_history (
                id, user_id, movie_id, status, user_rating, review,
                watched_at, is_favorite, rewatch_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.movie_id)
        .bind(entry.status.as_str())
        .bind(entry.user_rating)
        .bind(&entry.review)
        .bind(entry.watched_at)
        .bind(entry.is_favorite)
        .bind(entry.rewatch_count)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WatchHistoryEntry>> {
        let row = sqlx::query_as::<_, WatchHistoryRow>("SELECT * FROM watch_history WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(WatchHistoryEntry::try_from).transpose()
    }

    async fn find_by_user_and_movie(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> AppResult<Option<WatchHistoryEntry>> {
        let row = sqlx::query_as::<_, WatchHistoryRow>(
            "SELECT * FROM watch_history WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WatchHistoryEntry::try_from).transpose()
    }

    async fn list(
        &self,
        user_id: Uuid,
        status: Option<WatchStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<WatchHistoryEntry>> {
        let rows = sqlx::query_as::<_, WatchHistoryRow>(
            r#"
            SELECT * FROM watch_history
            WHERE user_id = $1
            AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WatchHistoryEntry::try_from).collect()
    }

    async fn count(&self, user_id: Uuid, status: Option<WatchStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*) FROM watch_history
            WHERE user_id = $1
            AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn status_counts(&self, user_id: Uuid) -> AppResult<StatusCounts> {
        let row = sqlx::query_as::<_, StatusCountsRow>(
            r#"
            SELECT
                count(*) FILTER (WHERE status = 'watchlist') AS watchlist,
                count(*) FILTER (WHERE status = 'watching') AS watching,
                count(*) FILTER (WHERE status = 'watched') AS watched,
                count(*) FILTER (WHERE is_favorite) AS favorites
            FROM watch_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(StatusCounts {
            watchlist: row.watchlist,
            watching: row.watching,
            watched: row.watched,
            favorites: row.favorites,
            total: row.watchlist + row.watching + row.watched,
        })
    }

    async fn list_watched(&self, user_id: Uuid) -> AppResult<Vec<WatchHistoryEntry>> {
        let rows = sqlx::query_as::<_, WatchHistoryRow>(
            "SELECT * FROM watch_history WHERE user_id = $1 AND status = 'watched'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WatchHistoryEntry::try_from).collect()
    }

    async fn update(&self, entry: &WatchHistoryEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE watch_history
            SET status = $2, user_rating = $3, review = $4, watched_at = $5,
                is_favorite = $6, rewatch_count = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(entry.id)
        .bind(entry.status.as_str())
        .bind(entry.user_rating)
        .bind(&entry.review)
        .bind(entry.watched_at)
        .bind(entry.is_favorite)
        .bind(entry.rewatch_count)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM watch_history WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
