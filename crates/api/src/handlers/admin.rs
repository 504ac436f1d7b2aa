//! Handlers for the `/admin` resource.
//!
//! Everything except [`create_session`] requires [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use nexus_core::error::CoreError;
use nexus_core::ledger::{CreditSource, TransactionKind};
use nexus_core::money::validate_amount;
use nexus_core::top_up::{created_cutoff, TopUpStatus};
use nexus_core::types::Amount;
use nexus_core::validation::{normalize_email, validate_password_strength, MIN_PASSWORD_LENGTH};
use nexus_db::models::catalog::{CatalogItem, CreateCatalogItem};
use nexus_db::models::top_up::TopUpRequest;
use nexus_db::models::user::AccountView;
use nexus_db::models::wallet_transaction::{BalanceAdjustment, CreateWalletTransaction};
use nexus_db::repositories::{CatalogRepo, TopUpRepo, UserRepo, WalletRepo};
use nexus_events::StoreEvent;
use serde::{Deserialize, Serialize};

use super::auth::MessageResponse;
use super::require;
use super::wallet::required_amount;
use crate::auth::jwt::generate_admin_token;
use crate::auth::password::hash_password;
use crate::engine::{apply_top_up, WebhookOutcome};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{secret_matches, RequireAdmin};
use crate::state::AppState;

/// Default and maximum page size for the top-up listing.
const DEFAULT_TOP_UP_LIMIT: i64 = 100;
const MAX_TOP_UP_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AdminSessionRequest {
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Body for endpoints that target a single account.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminTopUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub amount: Option<Amount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceMessage {
    pub message: String,
    pub balance: Amount,
}

#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub message: String,
    pub user: AccountView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpListParams {
    pub status: Option<String>,
    /// Only requests created more than this many minutes ago.
    pub older_than_mins: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceCompleteResponse {
    pub message: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Amount>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCatalogItemRequest {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<Amount>,
}

fn required_email(email: &str) -> Result<String, CoreError> {
    require(email, "Email required")?;
    Ok(normalize_email(email))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// POST /admin/session
///
/// Exchange the admin secret for a signed admin session token.
pub async fn create_session(
    State(state): State<AppState>,
    Json(input): Json<AdminSessionRequest>,
) -> AppResult<Json<AdminSessionResponse>> {
    if !secret_matches(&input.secret, &state.config.admin_secret) {
        tracing::warn!("Rejected admin session request");
        return Err(CoreError::Forbidden("Invalid admin secret".into()).into());
    }

    let token = generate_admin_token(&state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(AdminSessionResponse {
        token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
    }))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// POST /admin/topup
///
/// Credit an account directly.
pub async fn top_up(
    State(state): State<AppState>,
    RequireAdmin(credential): RequireAdmin,
    Json(input): Json<AdminTopUpRequest>,
) -> AppResult<Json<BalanceMessage>> {
    let email = required_email(&input.email)?;
    let amount = required_amount(input.amount)?;

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &email))?;

    let entry = CreateWalletTransaction {
        kind: TransactionKind::Deposit,
        amount,
        description: CreditSource::Admin.description().to_string(),
        reference: None,
    };
    let balance = match WalletRepo::adjust_balance(&state.pool, user.id, &entry).await? {
        BalanceAdjustment::Applied { balance } => balance,
        BalanceAdjustment::UserNotFound => return Err(CoreError::not_found("User", &email).into()),
        BalanceAdjustment::InsufficientFunds { balance } => {
            return Err(CoreError::Internal(format!(
                "Credit refused for user {} at balance {balance}",
                user.id
            ))
            .into());
        }
    };

    tracing::info!(user_id = user.id, %amount, %balance, ?credential, "Admin credit applied");
    state.event_bus.publish(StoreEvent::wallet_topped_up(
        user.id,
        &user.email,
        amount,
        CreditSource::Admin.description(),
    ));

    Ok(Json(BalanceMessage {
        message: format!("Added {amount} to {email}"),
        balance,
    }))
}

async fn set_frozen(state: &AppState, email: &str, frozen: bool) -> AppResult<Json<UserMessage>> {
    let email = required_email(email)?;
    let user = UserRepo::set_frozen(&state.pool, &email, frozen)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &email))?;

    let verb = if frozen { "frozen" } else { "unfrozen" };
    tracing::info!(user_id = user.id, frozen, "Account freeze flag changed");

    Ok(Json(UserMessage {
        message: format!("{email} is now {verb}"),
        user: AccountView::from(&user),
    }))
}

/// POST /admin/freeze
pub async fn freeze(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<EmailRequest>,
) -> AppResult<Json<UserMessage>> {
    set_frozen(&state, &input.email, true).await
}

/// POST /admin/unfreeze
pub async fn unfreeze(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<EmailRequest>,
) -> AppResult<Json<UserMessage>> {
    set_frozen(&state, &input.email, false).await
}

/// POST /admin/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<AdminResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = required_email(&input.email)?;
    require(&input.new_password, "Email and new password required")?;
    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)?;

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password_by_email(&state.pool, &email, &new_hash).await? {
        return Err(CoreError::not_found("User", &email).into());
    }

    tracing::info!(%email, "Password reset by admin");
    Ok(MessageResponse::new(format!("Password reset for {email}")))
}

/// DELETE /admin/delete
///
/// Irreversibly delete an account. Orders and top-up requests are kept.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = required_email(&input.email)?;
    if !UserRepo::delete_by_email(&state.pool, &email).await? {
        return Err(CoreError::not_found("User", &email).into());
    }

    tracing::warn!(%email, "Account deleted by admin");
    Ok(MessageResponse::new(format!("{email} deleted successfully")))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<AccountView>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(users.iter().map(AccountView::from).collect()))
}

// ---------------------------------------------------------------------------
// Top-up requests
// ---------------------------------------------------------------------------

/// GET /admin/topups?status=pending&olderThanMins=N&limit=M
///
/// Oldest first, so stale pending requests surface at the top.
pub async fn list_top_ups(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<TopUpListParams>,
) -> AppResult<Json<Vec<TopUpRequest>>> {
    let status = params
        .status
        .as_deref()
        .map(TopUpStatus::from_str_value)
        .transpose()
        .map_err(CoreError::Validation)?;

    let created_before = params
        .older_than_mins
        .map(|mins| created_cutoff(Utc::now(), mins))
        .transpose()
        .map_err(|e| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("olderThanMins: {msg}")),
            other => other,
        })?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_TOP_UP_LIMIT)
        .clamp(1, MAX_TOP_UP_LIMIT);

    let rows = TopUpRepo::list(&state.pool, status, created_before, limit).await?;
    Ok(Json(rows))
}

/// POST /admin/topups/{order_id}/complete
///
/// Force reconciliation of a pending request, for payments whose callback
/// never arrived. Runs the same exactly-once path as the webhook.
pub async fn complete_top_up(
    State(state): State<AppState>,
    RequireAdmin(credential): RequireAdmin,
    Path(order_id): Path<String>,
) -> AppResult<Json<ForceCompleteResponse>> {
    tracing::info!(%order_id, ?credential, "Admin forcing top-up completion");

    match apply_top_up(&state, &order_id, None).await? {
        WebhookOutcome::Credited { order_id, balance } => Ok(Json(ForceCompleteResponse {
            message: "Top-up credited".into(),
            order_id,
            balance: Some(balance),
        })),
        WebhookOutcome::AlreadyProcessed { order_id } => Ok(Json(ForceCompleteResponse {
            message: "Top-up already processed".into(),
            order_id,
            balance: None,
        })),
        WebhookOutcome::UnknownOrder { order_id } => {
            Err(CoreError::not_found("Top-up request", order_id).into())
        }
        WebhookOutcome::OwnerMissing { order_id } => {
            Err(CoreError::not_found("User", order_id).into())
        }
        WebhookOutcome::Ignored { status } => Err(AppError::InternalError(format!(
            "Unexpected outcome for forced completion: {status}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// POST /admin/catalog
pub async fn create_catalog_item(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateCatalogItemRequest>,
) -> AppResult<(StatusCode, Json<CatalogItem>)> {
    require(&input.slug, "Slug required")?;
    require(&input.name, "Name required")?;
    let price = input
        .price
        .ok_or_else(|| CoreError::Validation("Price required".into()))
        .and_then(validate_amount)?;

    let item = CatalogRepo::create(
        &state.pool,
        &CreateCatalogItem {
            slug: input.slug.trim().to_lowercase(),
            name: input.name.trim().to_string(),
            price,
        },
    )
    .await?;

    tracing::info!(item_id = item.id, slug = %item.slug, price = %item.price, "Catalog item created");
    Ok((StatusCode::CREATED, Json(item)))
}
