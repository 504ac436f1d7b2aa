//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /session                     -> create_session (admin secret in body)
/// POST   /topup                       -> top_up
/// POST   /freeze                      -> freeze
/// POST   /unfreeze                    -> unfreeze
/// POST   /reset-password              -> reset_password
/// DELETE /delete                      -> delete_user
/// GET    /users                       -> list_users
/// GET    /topups                      -> list_top_ups
/// POST   /topups/{order_id}/complete  -> complete_top_up
/// POST   /catalog                     -> create_catalog_item
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(admin::create_session))
        .route("/topup", post(admin::top_up))
        .route("/freeze", post(admin::freeze))
        .route("/unfreeze", post(admin::unfreeze))
        .route("/reset-password", post(admin::reset_password))
        .route("/delete", delete(admin::delete_user))
        .route("/users", get(admin::list_users))
        .route("/topups", get(admin::list_top_ups))
        .route("/topups/{order_id}/complete", post(admin::complete_top_up))
        .route("/catalog", post(admin::create_catalog_item))
}
