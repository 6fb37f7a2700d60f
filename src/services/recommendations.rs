//! The AI-recommendation orchestration pipeline: validate the prompt, run
//! one completion, extract titles, resolve them concurrently, persist. The
//! completion call failing aborts the whole request with nothing persisted;
//! individual titles failing to resolve do not.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::stores::{MovieStore, RecommendationStore},
    error::{AppError, AppResult},
    models::{Movie, Paginated, Pagination, Recommendation, RecommendationView, User},
    services::{
        parser::extract_movie_titles,
        prompt::{
            build_user_message, MAX_COMPLETION_TOKENS, RECOMMENDATION_SYSTEM_PROMPT,
            SOLO_TEMPERATURE,
        },
        providers::{ChatPrompt, CompletionClient},
        resolver::MovieResolver,
    },
};

/// Hard ceiling on the mood prompt, checked before any upstream call
pub const MAX_PROMPT_CHARS: usize = 500;

const MAX_FEEDBACK_COMMENT_CHARS: usize = 200;

pub struct RecommendationService {
    llm: Arc<dyn CompletionClient>,
    resolver: MovieResolver,
    store: Arc<dyn RecommendationStore>,
    movies: Arc<dyn MovieStore>,
}

impl RecommendationService {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        resolver: MovieResolver,
        store: Arc<dyn RecommendationStore>,
        movies: Arc<dyn MovieStore>,
    ) -> Self {
        Self {
            llm,
            resolver,
            store,
            movies,
        }
    }

    /// Runs the full pipeline for one mood prompt and persists the result.
    ///
    /// The persisted raw response is always complete, even when some or all
    /// extracted titles failed to resolve; an empty movie list is a valid
    /// outcome, not an error.
    pub async fn generate(&self, user: &User, prompt: &str) -> AppResult<RecommendationView> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "Please provide a mood/vibe description".to_string(),
            ));
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(AppError::Validation(format!(
                "Description too long. Please keep it under {} characters.",
                MAX_PROMPT_CHARS
            )));
        }

        let chat = ChatPrompt {
            system: RECOMMENDATION_SYSTEM_PROMPT.to_string(),
            user: build_user_message(trimmed, &user.preferences),
            temperature: SOLO_TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let ai_response = self.llm.complete(&chat).await?;

        let titles = extract_movie_titles(&ai_response);
        let movies = self.resolver.resolve_titles(&titles).await;

        tracing::info!(
            user_id = %user.id,
            parsed_titles = titles.len(),
            resolved = movies.len(),
            "Recommendation pipeline completed"
        );

        let recommendation = Recommendation::new(
            user.id,
            trimmed.to_string(),
            movies.iter().map(|movie| movie.id).collect(),
            ai_response,
            self.llm.model_id().to_string(),
        );
        self.store.create(&recommendation).await?;

        Ok(RecommendationView::new(recommendation, movies))
    }

    /// A user's recommendation history, newest first
    pub async fn history(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> AppResult<Paginated<RecommendationView>> {
        let offset = Pagination::offset(page, limit);
        let recommendations = self.store.list_by_user(user_id, limit as i64, offset).await?;
        let total = self.store.count_by_user(user_id).await? as u64;

        let all_ids: Vec<Uuid> = recommendations
            .iter()
            .flat_map(|rec| rec.recommended_movies.iter().copied())
            .collect();
        let movies = self.movies.find_by_ids(&all_ids).await?;

        let items = recommendations
            .into_iter()
            .map(|rec| {
                let populated = populate(&rec.recommended_movies, &movies);
                RecommendationView::new(rec, populated)
            })
            .collect();

        Ok(Paginated {
            items,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<RecommendationView> {
        let recommendation = self.owned(user_id, id, "view").await?;
        let movies = self
            .movies
            .find_by_ids(&recommendation.recommended_movies)
            .await?;
        let populated = populate(&recommendation.recommended_movies, &movies);
        Ok(RecommendationView::new(recommendation, populated))
    }

    /// Attaches feedback. Rating and comment are independent and each is
    /// settable exactly once.
    pub async fn add_feedback(
        &self,
        user_id: Uuid,
        id: Uuid,
        rating: Option<i16>,
        comment: Option<String>,
    ) -> AppResult<RecommendationView> {
        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::Validation(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }
        if let Some(comment) = &comment {
            if comment.chars().count() > MAX_FEEDBACK_COMMENT_CHARS {
                return Err(AppError::Validation(format!(
                    "Comment cannot exceed {} characters",
                    MAX_FEEDBACK_COMMENT_CHARS
                )));
            }
        }

        let mut recommendation = self.owned(user_id, id, "update").await?;

        if let Some(rating) = rating {
            if recommendation.feedback.rating.is_some() {
                return Err(AppError::Validation(
                    "Rating has already been submitted".to_string(),
                ));
            }
            recommendation.feedback.rating = Some(rating);
        }
        if let Some(comment) = comment {
            if recommendation.feedback.comment.is_some() {
                return Err(AppError::Validation(
                    "Comment has already been submitted".to_string(),
                ));
            }
            recommendation.feedback.comment = Some(comment);
        }

        recommendation.updated_at = chrono::Utc::now();
        self.store.update_feedback(&recommendation).await?;

        let movies = self
            .movies
            .find_by_ids(&recommendation.recommended_movies)
            .await?;
        let populated = populate(&recommendation.recommended_movies, &movies);
        Ok(RecommendationView::new(recommendation, populated))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let recommendation = self.owned(user_id, id, "delete").await?;
        self.store.delete(recommendation.id).await
    }

    async fn owned(&self, user_id: Uuid, id: Uuid, action: &str) -> AppResult<Recommendation> {
        let recommendation = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recommendation not found".to_string()))?;

        if recommendation.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "Not authorized to {} this recommendation",
                action
            )));
        }

        Ok(recommendation)
    }
}

/// Reorders fetched movies to match a stored reference list
fn populate(ids: &[Uuid], movies: &[Movie]) -> Vec<Movie> {
    ids.iter()
        .filter_map(|id| movies.iter().find(|movie| movie.id == *id).cloned())
        .collect()
}
