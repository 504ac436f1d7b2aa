//! Purchase order entity and purchase outcome.

use nexus_core::types::{Amount, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: DbId,
    pub reference: String,
    pub user_id: Option<DbId>,
    pub catalog_item_id: Option<DbId>,
    pub account_name: String,
    pub price: Amount,
    pub status: String,
    pub created_at: Timestamp,
}

/// Result of the purchase unit of work.
#[derive(Debug)]
pub enum PurchaseOutcome {
    Completed { order: Order, balance: Amount },
    InsufficientFunds { balance: Amount },
    UserNotFound,
}
