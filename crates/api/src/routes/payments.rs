//! Route definitions for `/api/payments`.

use axum::routing::post;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/api/payments`.
///
/// ```text
/// POST /create-payment  -> create_payment
/// POST /webhook         -> webhook (provider signature)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-payment", post(payments::create_payment))
        .route("/webhook", post(payments::webhook))
}
