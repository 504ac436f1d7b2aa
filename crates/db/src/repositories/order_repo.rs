//! Repository for the `orders` table and the purchase unit of work.

use nexus_core::ledger::{TransactionKind, ORDER_DELIVERED};
use nexus_core::order_id::generate_order_reference;
use nexus_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use super::WalletRepo;
use crate::models::catalog::CatalogItem;
use crate::models::order::{Order, PurchaseOutcome};
use crate::models::wallet_transaction::CreateWalletTransaction;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, reference, user_id, catalog_item_id, account_name, price, status, created_at";

/// Provides persistence for purchase orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Debit the item price and record a delivered order, atomically.
    ///
    /// The debit is a conditional update (`balance >= price`), so of two
    /// concurrent purchases that together exceed the balance exactly one
    /// succeeds. On any failure neither the debit nor the order is kept.
    pub async fn purchase(
        pool: &PgPool,
        user_id: DbId,
        item: &CatalogItem,
    ) -> Result<PurchaseOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(balance) = WalletRepo::debit_if_covered(&mut *tx, user_id, item.price).await?
        else {
            let current = WalletRepo::current_balance(&mut *tx, user_id).await?;
            tx.rollback().await?;
            return Ok(match current {
                Some(balance) => PurchaseOutcome::InsufficientFunds { balance },
                None => PurchaseOutcome::UserNotFound,
            });
        };

        let order = Self::insert(&mut *tx, user_id, item).await?;

        let entry = CreateWalletTransaction {
            kind: TransactionKind::Purchase,
            amount: -item.price,
            description: format!("Purchase of {}", item.name),
            reference: Some(order.reference.clone()),
        };
        WalletRepo::insert_transaction(&mut *tx, user_id, &entry).await?;

        tx.commit().await?;
        Ok(PurchaseOutcome::Completed { order, balance })
    }

    /// List a user's orders, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    async fn insert(
        conn: &mut PgConnection,
        user_id: DbId,
        item: &CatalogItem,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (reference, user_id, catalog_item_id, account_name, price, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(generate_order_reference())
            .bind(user_id)
            .bind(item.id)
            .bind(&item.name)
            .bind(item.price)
            .bind(ORDER_DELIVERED)
            .fetch_one(conn)
            .await
    }
}
