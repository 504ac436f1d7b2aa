//! Handler for the public catalog listing.

use axum::extract::State;
use axum::Json;
use nexus_db::models::catalog::CatalogItem;
use nexus_db::repositories::CatalogRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /catalog
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<CatalogItem>>> {
    let items = CatalogRepo::list_active(&state.pool).await?;
    Ok(Json(items))
}
