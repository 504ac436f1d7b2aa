//! Handlers for the `/auth` resource (register, login, password change).

use axum::extract::State;
use axum::Json;
use nexus_core::error::CoreError;
use nexus_core::validation::{
    normalize_email, validate_email, validate_password_strength, MIN_PASSWORD_LENGTH,
};
use nexus_db::models::user::{AccountView, CreateUser};
use nexus_db::repositories::UserRepo;
use nexus_events::StoreEvent;
use serde::{Deserialize, Serialize};

use super::require;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/register
///
/// Create an account with a zero balance.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<Json<RegisterResponse>> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(CoreError::Validation("Email and password required".into()).into());
    }
    let email = validate_email(&input.email)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)?;

    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // A concurrent registration for the same email surfaces as a 409 from
    // `uq_users_email`.
    let user = UserRepo::create(&state.pool, &CreateUser { email, password_hash }).await?;

    tracing::info!(user_id = user.id, email = %user.email, "User registered");
    state
        .event_bus
        .publish(StoreEvent::user_registered(user.id, &user.email));

    Ok(Json(RegisterResponse {
        message: "Registered successfully".into(),
        user: AccountView::from(&user),
    }))
}

/// POST /auth/login
///
/// Exchange email + password for a session token. Frozen accounts may log
/// in; the `frozen` flag in the response tells the client to lock the UI.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<Json<LoginResponse>> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(CoreError::Validation("Email and password required".into()).into());
    }

    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid credentials".into()));

    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(LoginResponse {
        token,
        user: AccountView::from(&user),
    }))
}

/// POST /auth/reset-password
///
/// Change the caller's password after re-checking the current one.
pub async fn reset_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    require(&input.current_password, "Current and new password are required")?;
    require(&input.new_password, "Current and new password are required")?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(CoreError::Unauthorized("Incorrect current password".into()).into());
    }

    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)?;
    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;
    tracing::info!(user_id = user.id, "Password changed");

    Ok(MessageResponse::new("Password updated successfully"))
}
