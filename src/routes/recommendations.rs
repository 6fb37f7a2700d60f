use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    error::AppResult,
    models::{Paginated, RecommendationView},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(generate).get(history))
        .route("/:id", get(get_one).delete(delete_one))
        .route("/:id/feedback", patch(add_feedback))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

async fn generate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> AppResult<(StatusCode, Json<RecommendationView>)> {
    let view = state.recommendations.generate(&user, &request.prompt).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<Paginated<RecommendationView>>> {
    let page = state
        .recommendations
        .history(user.id, params.page, params.limit)
        .await?;
    Ok(Json(page))
}

async fn get_one(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RecommendationView>> {
    let view = state.recommendations.get(user.id, id).await?;
    Ok(Json(view))
}

async fn add_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<Json<RecommendationView>> {
    let view = state
        .recommendations
        .add_feedback(user.id, id, request.rating, request.comment)
        .await?;
    Ok(Json(view))
}

async fn delete_one(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.recommendations.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
