//! Display-ledger transaction rows and the balance adjustment outcome.

use nexus_core::ledger::TransactionKind;
use nexus_core::types::{Amount, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `wallet_transactions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(rename = "type")]
    pub kind: String,
    /// Signed: credits positive, debits negative.
    pub amount: Amount,
    pub description: String,
    pub reference: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending a ledger row alongside a balance mutation.
#[derive(Debug, Clone)]
pub struct CreateWalletTransaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: String,
    pub reference: Option<String>,
}

/// Result of an atomic balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAdjustment {
    Applied { balance: Amount },
    InsufficientFunds { balance: Amount },
    UserNotFound,
}
