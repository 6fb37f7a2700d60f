use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::{
    auth::{
        jwt::generate_token,
        password::{hash_password, verify_password},
        CurrentUser,
    },
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/me/preferences", put(update_preferences))
}

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap())
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = request.name.trim();
    let name_len = name.chars().count();
    if !(2..=50).contains(&name_len) {
        return Err(AppError::Validation(
            "Name must be between 2 and 50 characters".to_string(),
        ));
    }

    let email = request.email.trim().to_lowercase();
    if !email_pattern().is_match(&email) {
        return Err(AppError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }

    if request.password.chars().count() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Validation(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)?;
    let user = User::new(name.to_string(), email, password_hash);
    state.users.create(&user).await?;

    tracing::info!(user_id = %user.id, "Account registered");

    let token = generate_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_days,
    )?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = request.email.trim().to_lowercase();

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized(
            "Account has been deactivated".to_string(),
        ));
    }

    let token = generate_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_days,
    )?;

    Ok(Json(AuthResponse { token, user }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub genres: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
}

async fn update_preferences(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Json(request): Json<UpdatePreferencesRequest>,
) -> AppResult<Json<User>> {
    if let Some(genres) = request.genres {
        user.preferences.genres = genres;
    }
    if let Some(languages) = request.languages {
        user.preferences.languages = languages;
    }
    user.updated_at = Utc::now();

    state.users.update_preferences(&user).await?;

    Ok(Json(user))
}
