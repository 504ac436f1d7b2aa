//! Handler for `GET /me`.

use axum::Json;
use nexus_db::models::user::AccountView;

use crate::error::AppResult;
use crate::middleware::auth::ActiveUser;

/// GET /me
///
/// The caller's account, read fresh from the database. Frozen accounts get
/// 403 `Account frozen` from the extractor.
pub async fn me(ActiveUser(user): ActiveUser) -> AppResult<Json<AccountView>> {
    Ok(Json(AccountView::from(&user)))
}
