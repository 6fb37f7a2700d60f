use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::movie::Movie;
use crate::error::{AppError, AppResult};

/// Where a movie sits in a user's history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    Watchlist,
    Watching,
    Watched,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watchlist => "watchlist",
            WatchStatus::Watching => "watching",
            WatchStatus::Watched => "watched",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "watchlist" => Ok(WatchStatus::Watchlist),
            "watching" => Ok(WatchStatus::Watching),
            "watched" => Ok(WatchStatus::Watched),
            other => Err(AppError::Validation(format!(
                "Status must be: watchlist, watching, or watched, got '{}'",
                other
            ))),
        }
    }
}

/// One movie in one user's history. A user holds at most one entry per
/// movie; repeat adds update the existing row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub status: WatchStatus,
    pub user_rating: Option<i16>,
    pub review: Option<String>,
    pub watched_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub rewatch_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchHistoryEntry {
    pub fn new(
        user_id: Uuid,
        movie_id: Uuid,
        status: WatchStatus,
        user_rating: Option<i16>,
        review: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            status,
            user_rating,
            review,
            watched_at: (status == WatchStatus::Watched).then_some(now),
            is_favorite: false,
            rewatch_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the entry to a new status, stamping `watched_at` on the first
    /// transition to watched
    pub fn set_status(&mut self, status: WatchStatus) {
        self.status = status;
        if status == WatchStatus::Watched && self.watched_at.is_none() {
            self.watched_at = Some(Utc::now());
        }
    }
}

/// A history entry with its movie populated
#[derive(Debug, Serialize)]
pub struct WatchHistoryView {
    pub id: Uuid,
    pub movie: Movie,
    pub status: WatchStatus,
    pub user_rating: Option<i16>,
    pub review: Option<String>,
    pub watched_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub rewatch_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchHistoryView {
    pub fn new(entry: WatchHistoryEntry, movie: Movie) -> Self {
        Self {
            id: entry.id,
            movie,
            status: entry.status,
            user_rating: entry.user_rating,
            review: entry.review,
            watched_at: entry.watched_at,
            is_favorite: entry.is_favorite,
            rewatch_count: entry.rewatch_count,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Per-status totals for a user's history
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusCounts {
    pub watchlist: i64,
    pub watching: i64,
    pub watched: i64,
    pub favorites: i64,
    pub total: i64,
}

/// One genre's share of a user's watched movies
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenreCount {
    pub genre: String,
    pub count: u32,
}

/// Aggregate figures over the watched portion of the history
#[derive(Debug, Serialize)]
pub struct WatchedStats {
    pub total_movies: i64,
    pub total_hours: i64,
    pub total_minutes: i64,
    pub average_rating: f64,
    pub favorite_genre: Option<String>,
    pub genre_breakdown: Vec<GenreCount>,
}

#[derive(Debug, Serialize)]
pub struct WatchStats {
    pub counts: StatusCounts,
    pub watched_stats: WatchedStats,
}
