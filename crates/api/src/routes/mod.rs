pub mod account;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod payments;
pub mod wallet;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree (everything except `/health`).
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                           register (public)
/// /auth/login                              login (public)
/// /auth/reset-password                     change own password (user)
///
/// /me                                      current account (active user)
/// /catalog                                 active catalog items (public)
///
/// /wallet/topup                            instant top-up (active user, if enabled)
/// /wallet/purchase                         buy a catalog item (active user)
/// /wallet/transactions                     ledger history (active user)
/// /wallet/orders                           order history (active user)
/// /wallet/topups                           top-up request history (active user)
///
/// /api/payments/create-payment             start a crypto top-up (public)
/// /api/payments/webhook                    provider callback (signature)
///
/// /admin/session                           exchange admin secret for a token
/// /admin/topup                             credit an account (admin)
/// /admin/freeze, /admin/unfreeze           toggle frozen flag (admin)
/// /admin/reset-password                    set a user's password (admin)
/// /admin/delete                            delete an account (admin, DELETE)
/// /admin/users                             list accounts (admin)
/// /admin/topups                            list top-up requests (admin)
/// /admin/topups/{order_id}/complete        force reconciliation (admin)
/// /admin/catalog                           create catalog item (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(account::router())
        .merge(catalog::router())
        .nest("/wallet", wallet::router())
        .nest("/api/payments", payments::router())
        .nest("/admin", admin::router())
}
