//! Personal watch history: status tracking, ratings, and viewing stats.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::stores::{MovieStore, WatchHistoryStore},
    error::{AppError, AppResult},
    models::{
        GenreCount, Paginated, Pagination, WatchHistoryEntry, WatchHistoryView, WatchStats,
        WatchStatus, WatchedStats,
    },
    services::resolver::MovieResolver,
};

const MAX_REVIEW_CHARS: usize = 500;

/// Fields accepted when adding a movie to the history
#[derive(Debug, Clone)]
pub struct AddHistoryRequest {
    pub tmdb_id: i64,
    pub status: WatchStatus,
    pub user_rating: Option<i16>,
    pub review: Option<String>,
}

/// Partial update for an existing entry
#[derive(Debug, Clone, Default)]
pub struct UpdateHistoryRequest {
    pub status: Option<WatchStatus>,
    pub user_rating: Option<i16>,
    pub review: Option<String>,
    pub is_favorite: Option<bool>,
}

pub struct WatchHistoryService {
    store: Arc<dyn WatchHistoryStore>,
    resolver: MovieResolver,
    movies: Arc<dyn MovieStore>,
}

impl WatchHistoryService {
    pub fn new(
        store: Arc<dyn WatchHistoryStore>,
        resolver: MovieResolver,
        movies: Arc<dyn MovieStore>,
    ) -> Self {
        Self {
            store,
            resolver,
            movies,
        }
    }

    /// Adds a movie by catalog id, or updates the user's existing entry for
    /// it. Returns the entry and whether it was newly created. The movie is
    /// resolved through the detail path, so first sight caches a full record.
    pub async fn add(
        &self,
        user_id: Uuid,
        request: AddHistoryRequest,
    ) -> AppResult<(WatchHistoryView, bool)> {
        validate_rating(request.user_rating)?;
        validate_review(request.review.as_deref())?;

        let movie = self.resolver.resolve_tmdb_id(request.tmdb_id).await?;

        if let Some(mut entry) = self
            .store
            .find_by_user_and_movie(user_id, movie.id)
            .await?
        {
            entry.set_status(request.status);
            if request.user_rating.is_some() {
                entry.user_rating = request.user_rating;
            }
            if request.review.is_some() {
                entry.review = request.review;
            }
            entry.updated_at = Utc::now();
            self.store.update(&entry).await?;
            return Ok((WatchHistoryView::new(entry, movie), false));
        }

        let entry = WatchHistoryEntry::new(
            user_id,
            movie.id,
            request.status,
            request.user_rating,
            request.review,
        );
        self.store.create(&entry).await?;

        Ok((WatchHistoryView::new(entry, movie), true))
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<WatchStatus>,
        page: u32,
        limit: u32,
    ) -> AppResult<Paginated<WatchHistoryView>> {
        let offset = Pagination::offset(page, limit);
        let entries = self.store.list(user_id, status, limit as i64, offset).await?;
        let total = self.store.count(user_id, status).await? as u64;

        let movie_ids: Vec<Uuid> = entries.iter().map(|entry| entry.movie_id).collect();
        let movies = self.movies.find_by_ids(&movie_ids).await?;

        let items = entries
            .into_iter()
            .filter_map(|entry| {
                movies
                    .iter()
                    .find(|movie| movie.id == entry.movie_id)
                    .cloned()
                    .map(|movie| WatchHistoryView::new(entry, movie))
            })
            .collect();

        Ok(Paginated {
            items,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateHistoryRequest,
    ) -> AppResult<WatchHistoryView> {
        validate_rating(request.user_rating)?;
        validate_review(request.review.as_deref())?;

        let mut entry = self.owned(user_id, id).await?;

        if let Some(status) = request.status {
            entry.set_status(status);
        }
        if request.user_rating.is_some() {
            entry.user_rating = request.user_rating;
        }
        if request.review.is_some() {
            entry.review = request.review;
        }
        if let Some(is_favorite) = request.is_favorite {
            entry.is_favorite = is_favorite;
        }

        entry.updated_at = Utc::now();
        self.store.update(&entry).await?;
        self.with_movie(entry).await
    }

    pub async fn toggle_favorite(&self, user_id: Uuid, id: Uuid) -> AppResult<WatchHistoryView> {
        let mut entry = self.owned(user_id, id).await?;
        entry.is_favorite = !entry.is_favorite;
        entry.updated_at = Utc::now();
        self.store.update(&entry).await?;
        self.with_movie(entry).await
    }

    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let entry = self.owned(user_id, id).await?;
        self.store.delete(entry.id).await
    }

    /// Aggregates the watched portion of the history: totals, runtime,
    /// genre breakdown, and average of the ratings the user has given.
    pub async fn stats(&self, user_id: Uuid) -> AppResult<WatchStats> {
        let counts = self.store.status_counts(user_id).await?;
        let watched = self.store.list_watched(user_id).await?;

        let movie_ids: Vec<Uuid> = watched.iter().map(|entry| entry.movie_id).collect();
        let movies = self.movies.find_by_ids(&movie_ids).await?;

        let mut total_minutes: i64 = 0;
        let mut genre_tally: Vec<GenreCount> = Vec::new();

        for entry in &watched {
            let Some(movie) = movies.iter().find(|movie| movie.id == entry.movie_id) else {
                continue;
            };
            total_minutes += movie.runtime as i64;
            for genre in &movie.genres {
                match genre_tally.iter_mut().find(|count| count.genre == *genre) {
                    Some(count) => count.count += 1,
                    None => genre_tally.push(GenreCount {
                        genre: genre.clone(),
                        count: 1,
                    }),
                }
            }
        }

        genre_tally.sort_by(|a, b| b.count.cmp(&a.count));
        let favorite_genre = genre_tally.first().map(|count| count.genre.clone());

        let ratings: Vec<i16> = watched.iter().filter_map(|entry| entry.user_rating).collect();
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            let sum: i64 = ratings.iter().map(|rating| *rating as i64).sum();
            let avg = sum as f64 / ratings.len() as f64;
            (avg * 10.0).round() / 10.0
        };

        Ok(WatchStats {
            watched_stats: WatchedStats {
                total_movies: counts.watched,
                total_hours: total_minutes / 60,
                total_minutes,
                average_rating,
                favorite_genre,
                genre_breakdown: genre_tally,
            },
            counts,
        })
    }

    async fn owned(&self, user_id: Uuid, id: Uuid) -> AppResult<WatchHistoryEntry> {
        let entry = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Watch history item not found".to_string()))?;

        if entry.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to modify this record".to_string(),
            ));
        }

        Ok(entry)
    }

    async fn with_movie(&self, entry: WatchHistoryEntry) -> AppResult<WatchHistoryView> {
        let movies = self.movies.find_by_ids(&[entry.movie_id]).await?;
        let movie = movies
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;
        Ok(WatchHistoryView::new(entry, movie))
    }
}

fn validate_rating(rating: Option<i16>) -> AppResult<()> {
    if let Some(rating) = rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_review(review: Option<&str>) -> AppResult<()> {
    if let Some(review) = review {
        if review.chars().count() > MAX_REVIEW_CHARS {
            return Err(AppError::Validation(format!(
                "Review cannot exceed {} characters",
                MAX_REVIEW_CHARS
            )));
        }
    }
    Ok(())
}
