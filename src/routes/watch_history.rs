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
    models::{Paginated, WatchHistoryView, WatchStats, WatchStatus},
    services::watch_history::{AddHistoryRequest, UpdateHistoryRequest},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add).get(list))
        .route("/stats", get(stats))
        .route("/:id", patch(update).delete(remove))
        .route("/:id/favorite", patch(toggle_favorite))
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub tmdb_id: i64,
    pub status: Option<String>,
    pub user_rating: Option<i16>,
    pub review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub status: Option<String>,
    pub user_rating: Option<i16>,
    pub review: Option<String>,
    pub is_favorite: Option<bool>,
}

async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddRequest>,
) -> AppResult<(StatusCode, Json<WatchHistoryView>)> {
    let status = match request.status.as_deref() {
        Some(value) => WatchStatus::parse(value)?,
        None => WatchStatus::Watchlist,
    };

    let (view, created) = state
        .watch_history
        .add(
            user.id,
            AddHistoryRequest {
                tmdb_id: request.tmdb_id,
                status,
                user_rating: request.user_rating,
                review: request.review,
            },
        )
        .await?;

    let code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(view)))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Paginated<WatchHistoryView>>> {
    let status = params
        .status
        .as_deref()
        .map(WatchStatus::parse)
        .transpose()?;
    let page = state
        .watch_history
        .list(user.id, status, params.page, params.limit)
        .await?;
    Ok(Json(page))
}

async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<WatchStats>> {
    let stats = state.watch_history.stats(user.id).await?;
    Ok(Json(stats))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRequest>,
) -> AppResult<Json<WatchHistoryView>> {
    let status = request
        .status
        .as_deref()
        .map(WatchStatus::parse)
        .transpose()?;

    let view = state
        .watch_history
        .update(
            user.id,
            id,
            UpdateHistoryRequest {
                status,
                user_rating: request.user_rating,
                review: request.review,
                is_favorite: request.is_favorite,
            },
        )
        .await?;
    Ok(Json(view))
}

async fn toggle_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WatchHistoryView>> {
    let view = state.watch_history.toggle_favorite(user.id, id).await?;
    Ok(Json(view))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.watch_history.remove(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
