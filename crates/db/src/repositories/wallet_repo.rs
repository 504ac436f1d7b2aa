//! Balance mutations and the `wallet_transactions` display ledger.
//!
//! Every change to `users.balance` is a single conditional
//! `UPDATE ... SET balance = balance + $delta` so Postgres row locking
//! serializes concurrent writers on the same user. Application code never
//! reads a balance and writes it back.

use nexus_core::types::{Amount, DbId};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::wallet_transaction::{
    BalanceAdjustment, CreateWalletTransaction, WalletTransaction,
};

/// Column list shared across queries to avoid repetition.
const TX_COLUMNS: &str = "id, user_id, kind, amount, description, reference, created_at";

/// Default page size for transaction history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Provides the balance mutation contract and ledger reads.
pub struct WalletRepo;

impl WalletRepo {
    /// Atomically apply `entry.amount` (signed) to a user's balance and
    /// append the matching ledger row.
    ///
    /// Credits always apply. Debits apply only if the resulting balance is
    /// non-negative; otherwise nothing is written and
    /// [`BalanceAdjustment::InsufficientFunds`] reports the current balance.
    pub async fn adjust_balance(
        pool: &PgPool,
        user_id: DbId,
        entry: &CreateWalletTransaction,
    ) -> Result<BalanceAdjustment, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated: Option<(Amount,)> = sqlx::query_as(
            "UPDATE users SET balance = balance + $2
             WHERE id = $1 AND ($2 >= 0 OR balance + $2 >= 0)
             RETURNING balance",
        )
        .bind(user_id)
        .bind(entry.amount)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((balance,)) = updated else {
            let current = Self::current_balance(&mut *tx, user_id).await?;
            tx.rollback().await?;
            return Ok(match current {
                Some(balance) => BalanceAdjustment::InsufficientFunds { balance },
                None => BalanceAdjustment::UserNotFound,
            });
        };

        Self::insert_transaction(&mut *tx, user_id, entry).await?;
        tx.commit().await?;

        tracing::debug!(user_id, delta = %entry.amount, %balance, "Balance adjusted");
        Ok(BalanceAdjustment::Applied { balance })
    }

    /// List a user's ledger rows, newest first.
    pub async fn list_transactions(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {TX_COLUMNS} FROM wallet_transactions
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, WalletTransaction>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Unit-of-work building blocks (run inside a caller's transaction)
    // -----------------------------------------------------------------------

    /// Credit the user owning `email`. Returns `(user_id, new_balance)`, or
    /// `None` if no user has that email.
    pub(crate) async fn credit_by_email(
        conn: &mut PgConnection,
        email: &str,
        amount: Amount,
    ) -> Result<Option<(DbId, Amount)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE users SET balance = balance + $2
             WHERE email = $1
             RETURNING id, balance",
        )
        .bind(email)
        .bind(amount)
        .fetch_optional(conn)
        .await
    }

    /// Debit `price` if the balance covers it. Returns the new balance, or
    /// `None` if the user is missing or the balance is too low.
    pub(crate) async fn debit_if_covered(
        conn: &mut PgConnection,
        user_id: DbId,
        price: Amount,
    ) -> Result<Option<Amount>, sqlx::Error> {
        let row: Option<(Amount,)> = sqlx::query_as(
            "UPDATE users SET balance = balance - $2
             WHERE id = $1 AND balance >= $2
             RETURNING balance",
        )
        .bind(user_id)
        .bind(price)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|(balance,)| balance))
    }

    pub(crate) async fn current_balance(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Option<Amount>, sqlx::Error> {
        let row: Option<(Amount,)> = sqlx::query_as("SELECT balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(|(balance,)| balance))
    }

    pub(crate) async fn insert_transaction(
        conn: &mut PgConnection,
        user_id: DbId,
        entry: &CreateWalletTransaction,
    ) -> Result<(), sqlx::Error> {
        debug_assert!(entry.amount != Decimal::ZERO, "ledger rows must move money");
        sqlx::query(
            "INSERT INTO wallet_transactions (user_id, kind, amount, description, reference)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user_id)
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(&entry.reference)
        .execute(conn)
        .await?;
        Ok(())
    }
}
