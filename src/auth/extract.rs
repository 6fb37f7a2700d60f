//! Authenticated-identity extraction for handlers.
//!
//! Identity is always an explicit handler parameter; services never read
//! ambient session state.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{auth::jwt::validate_token, error::AppError, models::User, state::AppState};

/// The authenticated account behind a request, loaded fresh from the user
/// store so deactivated or deleted accounts are rejected even with a valid
/// token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Not authorized, please login".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Not authorized, please login".to_string()))?;

        let claims = validate_token(token, &state.config.jwt_secret)?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized(
                "Account has been deactivated".to_string(),
            ));
        }

        Ok(CurrentUser(user))
    }
}
