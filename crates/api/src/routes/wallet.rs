//! Route definitions for the `/wallet` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::wallet;
use crate::state::AppState;

/// Routes mounted at `/wallet`.
///
/// ```text
/// POST /topup         -> instant_top_up
/// POST /purchase      -> purchase
/// GET  /transactions  -> list_transactions
/// GET  /orders        -> list_orders
/// GET  /topups        -> list_top_ups
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/topup", post(wallet::instant_top_up))
        .route("/purchase", post(wallet::purchase))
        .route("/transactions", get(wallet::list_transactions))
        .route("/orders", get(wallet::list_orders))
        .route("/topups", get(wallet::list_top_ups))
}
