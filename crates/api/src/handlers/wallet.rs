//! Handlers for the `/wallet` resource: instant top-up, purchases and
//! history.
//!
//! Every handler requires an active (non-frozen) user session.

use axum::extract::State;
use axum::Json;
use nexus_core::error::CoreError;
use nexus_core::ledger::{CreditSource, TransactionKind};
use nexus_core::money::validate_amount;
use nexus_core::types::{Amount, DbId};
use nexus_db::models::order::{Order, PurchaseOutcome};
use nexus_db::models::top_up::TopUpRequest;
use nexus_db::models::wallet_transaction::{
    BalanceAdjustment, CreateWalletTransaction, WalletTransaction,
};
use nexus_db::repositories::wallet_repo::DEFAULT_HISTORY_LIMIT;
use nexus_db::repositories::{CatalogRepo, OrderRepo, TopUpRepo, WalletRepo};
use nexus_events::StoreEvent;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::ActiveUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TopUpRequestBody {
    #[serde(default)]
    pub amount: Option<Amount>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub message: String,
    pub balance: Amount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub item_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub order: Order,
    pub balance: Amount,
}

/// Unwrap an optional amount field and apply the shared amount rules.
pub(crate) fn required_amount(amount: Option<Amount>) -> Result<Amount, CoreError> {
    let amount = amount.ok_or_else(|| CoreError::Validation("Amount required".into()))?;
    validate_amount(amount)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /wallet/topup
///
/// Credit the caller's balance without an external payment. Disabled
/// unless `INSTANT_TOP_UP_ENABLED` is set.
pub async fn instant_top_up(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Json(input): Json<TopUpRequestBody>,
) -> AppResult<Json<BalanceResponse>> {
    if !state.config.instant_top_up_enabled {
        return Err(CoreError::Forbidden("Instant top-up is disabled".into()).into());
    }
    let amount = required_amount(input.amount)?;

    let entry = CreateWalletTransaction {
        kind: TransactionKind::Deposit,
        amount,
        description: CreditSource::Instant.description().to_string(),
        reference: None,
    };

    let balance = match WalletRepo::adjust_balance(&state.pool, user.id, &entry).await? {
        BalanceAdjustment::Applied { balance } => balance,
        BalanceAdjustment::UserNotFound => return Err(CoreError::not_found("User", user.id).into()),
        BalanceAdjustment::InsufficientFunds { balance } => {
            // Credits are never refused; only reachable through a corrupted balance.
            return Err(CoreError::Internal(format!(
                "Credit refused for user {} at balance {balance}",
                user.id
            ))
            .into());
        }
    };

    tracing::info!(user_id = user.id, %amount, %balance, "Instant top-up applied");
    state.event_bus.publish(StoreEvent::wallet_topped_up(
        user.id,
        &user.email,
        amount,
        CreditSource::Instant.description(),
    ));

    Ok(Json(BalanceResponse {
        message: format!("Successfully added {amount} to your balance"),
        balance,
    }))
}

/// POST /wallet/purchase
///
/// Buy a catalog item at its stored price. The debit and the order row are
/// written together or not at all.
pub async fn purchase(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Json(input): Json<PurchaseRequest>,
) -> AppResult<Json<PurchaseResponse>> {
    let item = CatalogRepo::find_active_by_id(&state.pool, input.item_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Catalog item", input.item_id))?;

    match OrderRepo::purchase(&state.pool, user.id, &item).await? {
        PurchaseOutcome::Completed { order, balance } => {
            tracing::info!(
                user_id = user.id,
                reference = %order.reference,
                price = %order.price,
                %balance,
                "Purchase completed"
            );
            state.event_bus.publish(StoreEvent::order_purchased(
                user.id,
                &user.email,
                order.price,
                &order.reference,
            ));
            Ok(Json(PurchaseResponse { order, balance }))
        }
        PurchaseOutcome::InsufficientFunds { balance } => {
            tracing::debug!(user_id = user.id, %balance, price = %item.price, "Purchase refused");
            Err(CoreError::InsufficientFunds {
                balance,
                required: item.price,
            }
            .into())
        }
        PurchaseOutcome::UserNotFound => Err(CoreError::not_found("User", user.id).into()),
    }
}

/// GET /wallet/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
) -> AppResult<Json<Vec<WalletTransaction>>> {
    let rows = WalletRepo::list_transactions(&state.pool, user.id, DEFAULT_HISTORY_LIMIT).await?;
    Ok(Json(rows))
}

/// GET /wallet/orders
pub async fn list_orders(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(OrderRepo::list_for_user(&state.pool, user.id).await?))
}

/// GET /wallet/topups
pub async fn list_top_ups(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
) -> AppResult<Json<Vec<TopUpRequest>>> {
    Ok(Json(TopUpRepo::list_for_email(&state.pool, &user.email).await?))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn amount_is_required() {
        let err = required_amount(None).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Amount required");
    }

    #[test]
    fn amount_rules_apply() {
        assert!(required_amount(Some(Amount::from(-5))).is_err());
        assert!(required_amount(Some(Amount::from_str("1.234").unwrap())).is_err());
        assert_eq!(
            required_amount(Some(Amount::from_str("10.50").unwrap())).unwrap(),
            Amount::from_str("10.5").unwrap()
        );
    }
}
