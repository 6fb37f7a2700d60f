use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    error::AppResult,
    models::{PartyStatus, PreferenceSubmission, WatchParty, WatchPartyView},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/mine", get(mine))
        .route("/join/:invite_code", post(join))
        .route("/:id", get(get_one).delete(delete_one))
        .route("/:id/preferences", post(submit_preferences))
        .route("/:id/recommendation", post(generate_recommendation))
        .route("/:id/status", patch(update_status))
        .route("/:id/leave", delete(leave))
}

#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    pub name: String,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub guest_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MineQuery {
    pub status: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreatePartyRequest>,
) -> AppResult<(StatusCode, Json<WatchParty>)> {
    let party = state
        .watch_parties
        .create(&user, &request.name, request.scheduled_for)
        .await?;
    Ok((StatusCode::CREATED, Json(party)))
}

async fn mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<MineQuery>,
) -> AppResult<Json<Vec<WatchParty>>> {
    let status = params
        .status
        .as_deref()
        .map(PartyStatus::parse)
        .transpose()?;
    let parties = state.watch_parties.my_parties(user.id, status).await?;
    Ok(Json(parties))
}

async fn get_one(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WatchPartyView>> {
    let view = state.watch_parties.get(user.id, id).await?;
    Ok(Json(view))
}

async fn join(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invite_code): Path<String>,
    request: Option<Json<JoinRequest>>,
) -> AppResult<Json<WatchParty>> {
    let guest_name = request.and_then(|Json(body)| body.guest_name);
    let party = state
        .watch_parties
        .join(&user, &invite_code, guest_name)
        .await?;
    Ok(Json(party))
}

async fn submit_preferences(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(submission): Json<PreferenceSubmission>,
) -> AppResult<Json<WatchParty>> {
    let party = state
        .watch_parties
        .submit_preferences(user.id, id, &submission)
        .await?;
    Ok(Json(party))
}

async fn generate_recommendation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WatchPartyView>> {
    let view = state.watch_parties.generate_recommendation(user.id, id).await?;
    Ok(Json(view))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<WatchParty>> {
    let status = PartyStatus::parse(&request.status)?;
    let party = state
        .watch_parties
        .update_status(user.id, id, status)
        .await?;
    Ok(Json(party))
}

async fn leave(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.watch_parties.leave(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_one(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.watch_parties.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
