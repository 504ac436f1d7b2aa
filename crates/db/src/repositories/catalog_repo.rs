//! Repository for the `catalog_items` table.

use nexus_core::types::DbId;
use sqlx::PgPool;

use crate::models::catalog::{CatalogItem, CreateCatalogItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, name, price, is_active, created_at, updated_at";

/// Provides CRUD operations for catalog items.
pub struct CatalogRepo;

impl CatalogRepo {
    /// Insert a new active item, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCatalogItem,
    ) -> Result<CatalogItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO catalog_items (slug, name, price)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CatalogItem>(&query)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(input.price)
            .fetch_one(pool)
            .await
    }

    /// List purchasable items, cheapest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<CatalogItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM catalog_items
             WHERE is_active = true
             ORDER BY price ASC, id ASC"
        );
        sqlx::query_as::<_, CatalogItem>(&query).fetch_all(pool).await
    }

    /// Find an item that can currently be purchased.
    pub async fn find_active_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CatalogItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM catalog_items WHERE id = $1 AND is_active = true");
        sqlx::query_as::<_, CatalogItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
