use axum::routing::get;
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(account::me))
}
