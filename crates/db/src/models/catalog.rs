//! Catalog item entity and DTOs.

use nexus_core::types::{Amount, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `catalog_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub price: Amount,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a catalog item.
#[derive(Debug)]
pub struct CreateCatalogItem {
    pub slug: String,
    pub name: String,
    pub price: Amount,
}
