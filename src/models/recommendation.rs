use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::movie::Movie;

/// Feedback attached to a recommendation. Each field is settable exactly
/// once, independently of the other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

/// One AI recommendation transaction.
///
/// `recommended_movies` holds only the titles that resolved against the
/// cache; `ai_response` is always the complete raw model output, so the list
/// length says nothing about the text content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub recommended_movies: Vec<Uuid>,
    pub ai_response: String,
    pub ai_model: String,
    pub feedback: Feedback,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn new(
        user_id: Uuid,
        prompt: String,
        recommended_movies: Vec<Uuid>,
        ai_response: String,
        ai_model: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt,
            recommended_movies,
            ai_response,
            ai_model,
            feedback: Feedback::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A recommendation with its movie references populated
#[derive(Debug, Serialize)]
pub struct RecommendationView {
    pub id: Uuid,
    pub prompt: String,
    pub movies: Vec<Movie>,
    pub ai_response: String,
    pub ai_model: String,
    pub feedback: Feedback,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecommendationView {
    pub fn new(recommendation: Recommendation, movies: Vec<Movie>) -> Self {
        Self {
            id: recommendation.id,
            prompt: recommendation.prompt,
            movies,
            ai_response: recommendation.ai_response,
            ai_model: recommendation.ai_model,
            feedback: recommendation.feedback,
            created_at: recommendation.created_at,
            updated_at: recommendation.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recommendation_has_empty_feedback() {
        let recommendation = Recommendation::new(
            Uuid::new_v4(),
            "something thrilling".to_string(),
            vec![],
            "1. **Inception (2010)**".to_string(),
            "llama-3.3-70b-versatile".to_string(),
        );
        assert_eq!(recommendation.feedback, Feedback::default());
        assert_eq!(recommendation.created_at, recommendation.updated_at);
    }
}
