//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nexus_core::error::CoreError;
use nexus_core::roles::ROLE_USER;
use nexus_core::types::DbId;
use nexus_db::models::user::User;
use nexus_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the
/// `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// `claims.sub`: a user id, or the admin subject for admin sessions.
    pub user_id: DbId,
    pub role: String,
}

/// Pull the token out of `Authorization: Bearer <token>`, if present.
pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get("authorization").is_none() {
            return Err(CoreError::Unauthorized("Missing Authorization header".into()).into());
        }

        let token = bearer_token(parts).ok_or_else(|| {
            CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| CoreError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// The caller's current user row, loaded fresh on every request.
///
/// Rejects admin session tokens (401), deleted users (404) and frozen
/// accounts (403 `Account frozen`).
pub struct ActiveUser(pub User);

impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = load_user(parts, state).await?;
        if user.frozen {
            return Err(CoreError::Forbidden("Account frozen".into()).into());
        }
        Ok(ActiveUser(user))
    }
}

/// Like [`ActiveUser`] but also admits frozen accounts. Used where a frozen
/// user must still act on their own credentials (password change).
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(load_user(parts, state).await?))
    }
}

async fn load_user(parts: &mut Parts, state: &AppState) -> Result<User, AppError> {
    let auth = AuthUser::from_request_parts(parts, state).await?;
    if auth.role != ROLE_USER {
        return Err(CoreError::Unauthorized("User session required".into()).into());
    }
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", auth.user_id).into())
}
