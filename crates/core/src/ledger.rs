//! Order statuses and display-ledger transaction kinds.
//!
//! Neither of these is a source of truth for balance; the `users.balance`
//! column is. They exist so purchases and credits can be listed back to the
//! account holder.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Status stored on every order. Purchases deliver immediately, so no
/// other status is ever written.
pub const ORDER_DELIVERED: &str = "delivered";

// ---------------------------------------------------------------------------
// Wallet transactions
// ---------------------------------------------------------------------------

pub const KIND_DEPOSIT: &str = "deposit";
pub const KIND_PURCHASE: &str = "purchase";
pub const KIND_REFUND: &str = "refund";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Purchase,
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => KIND_DEPOSIT,
            Self::Purchase => KIND_PURCHASE,
            Self::Refund => KIND_REFUND,
        }
    }
}

/// Where a credit came from. Used for transaction descriptions and
/// notification subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditSource {
    Admin,
    Instant,
    Crypto,
}

impl CreditSource {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Admin credit",
            Self::Instant => "Instant top-up",
            Self::Crypto => "Crypto top-up",
        }
    }
}
