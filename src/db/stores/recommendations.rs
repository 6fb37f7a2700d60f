use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Feedback, Recommendation};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn create(&self, recommendation: &Recommendation) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Recommendation>>;

    /// A user's recommendations, newest first
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recommendation>>;

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64>;
    async fn update_feedback(&self, recommendation: &Recommendation) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: Uuid,
    user_id: Uuid,
    prompt: String,
    recommended_movies: Json<Vec<Uuid>>,
    ai_response: String,
    ai_model: String,
    feedback_rating: Option<i16>,
    feedback_comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecommendationRow> for Recommendation {
    fn from(row: RecommendationRow) -> Self {
        Recommendation {
            id: row.id,
            user_id: row.user_id,
            prompt: row.prompt,
            recommended_movies: row.recommended_movies.0,
            ai_response: row.ai_response,
            ai_model: row.ai_model,
            feedback: Feedback {
                rating: row.feedback_rating,
                comment: row.feedback_comment,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn create(&self, recommendation: &Recommendation) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations (
                id, user_id, prompt, recommended_movies, ai_response, ai_model,
                feedback_rating, feedback_comment, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(recommendation.id)
        .bind(recommendation.user_id)
        .bind(&recommendation.prompt)
        .bind(Json(&recommendation.recommended_movies))
        .bind(&recommendation.ai_response)
        .bind(&recommendation.ai_model)
        .bind(recommendation.feedback.rating)
        .bind(&recommendation.feedback.comment)
        .bind(recommendation.created_at)
        .bind(recommendation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        let row =
            sqlx::query_as::<_, RecommendationRow>("SELECT * FROM recommendations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Recommendation::from))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT * FROM recommendations
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Recommendation::from).collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM recommendations WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn update_feedback(&self, recommendation: &Recommendation) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE recommendations
            SET feedback_rating = $2, feedback_comment = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(recommendation.id)
        .bind(recommendation.feedback.rating)
        .bind(&recommendation.feedback.comment)
        .bind(recommendation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
