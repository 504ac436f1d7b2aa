//! Repository for the `top_up_requests` table and the top-up completion
//! unit of work.

use nexus_core::ledger::{CreditSource, TransactionKind};
use nexus_core::top_up::{TopUpStatus, STATUS_COMPLETED, STATUS_PENDING};
use nexus_core::types::{Amount, Timestamp};
use sqlx::{PgConnection, PgPool};

use super::WalletRepo;
use crate::models::top_up::{CreateTopUpRequest, TopUpCompletion, TopUpRequest};
use crate::models::wallet_transaction::CreateWalletTransaction;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, order_id, email, amount, status, pay_currency, provider_payment_id, \
                       reported_amount, completed_at, created_at, updated_at";

/// Provides persistence for top-up requests.
pub struct TopUpRepo;

impl TopUpRepo {
    /// Insert a new `pending` request, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTopUpRequest,
    ) -> Result<TopUpRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO top_up_requests (order_id, email, amount, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TopUpRequest>(&query)
            .bind(&input.order_id)
            .bind(&input.email)
            .bind(input.amount)
            .bind(STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    /// Record the provider's invoice identifiers on a request.
    pub async fn attach_invoice(
        pool: &PgPool,
        order_id: &str,
        provider_payment_id: Option<&str>,
        pay_currency: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE top_up_requests SET provider_payment_id = $2, pay_currency = $3
             WHERE order_id = $1",
        )
        .bind(order_id)
        .bind(provider_payment_id)
        .bind(pay_currency)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a request by its order id.
    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<TopUpRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM top_up_requests WHERE order_id = $1");
        sqlx::query_as::<_, TopUpRequest>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// List every request made for an email, newest first.
    pub async fn list_for_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Vec<TopUpRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM top_up_requests
             WHERE email = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, TopUpRequest>(&query)
            .bind(email)
            .fetch_all(pool)
            .await
    }

    /// List requests filtered by status and/or creation cutoff, oldest first.
    pub async fn list(
        pool: &PgPool,
        status: Option<TopUpStatus>,
        created_before: Option<Timestamp>,
        limit: i64,
    ) -> Result<Vec<TopUpRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM top_up_requests
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::TIMESTAMPTZ IS NULL OR created_at < $2)
             ORDER BY created_at ASC, id ASC
             LIMIT $3"
        );
        sqlx::query_as::<_, TopUpRequest>(&query)
            .bind(status.map(|s| s.as_str()))
            .bind(created_before)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Count `pending` requests created before `cutoff`.
    pub async fn count_pending_before(pool: &PgPool, cutoff: Timestamp) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM top_up_requests WHERE status = $1 AND created_at < $2",
        )
        .bind(STATUS_PENDING)
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Complete a request and credit its owner as one unit of work.
    ///
    /// Inside a single transaction:
    /// 1. lock the request row (`FOR UPDATE`), so concurrent deliveries for
    ///    the same order id queue behind each other;
    /// 2. return [`TopUpCompletion::AlreadyProcessed`] unless it may still
    ///    move to `completed`;
    /// 3. credit the owner's balance by the *recorded* amount;
    /// 4. flip the status with a conditional `WHERE status = 'pending'`
    ///    update and append the deposit ledger row.
    ///
    /// The status flip is written after the credit; any failure rolls back
    /// both, leaving the request `pending` and safe to retry.
    /// `reported_amount` is stored for audit only.
    pub async fn complete(
        pool: &PgPool,
        order_id: &str,
        reported_amount: Option<Amount>,
    ) -> Result<TopUpCompletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(request) = Self::lock_by_order_id(&mut *tx, order_id).await? else {
            tx.rollback().await?;
            return Ok(TopUpCompletion::NotFound);
        };

        if !request.status().can_transition_to(TopUpStatus::Completed) {
            tx.rollback().await?;
            return Ok(TopUpCompletion::AlreadyProcessed(request));
        }

        let Some((user_id, balance)) =
            WalletRepo::credit_by_email(&mut *tx, &request.email, request.amount).await?
        else {
            tx.rollback().await?;
            return Ok(TopUpCompletion::OwnerMissing(request));
        };

        let Some(completed) = Self::mark_completed(&mut *tx, order_id, reported_amount).await?
        else {
            // Unreachable while the row lock is held; roll back the credit.
            tx.rollback().await?;
            return Ok(TopUpCompletion::AlreadyProcessed(request));
        };

        let entry = CreateWalletTransaction {
            kind: TransactionKind::Deposit,
            amount: completed.amount,
            description: CreditSource::Crypto.description().to_string(),
            reference: Some(completed.order_id.clone()),
        };
        WalletRepo::insert_transaction(&mut *tx, user_id, &entry).await?;

        tx.commit().await?;

        Ok(TopUpCompletion::Credited {
            request: completed,
            user_id,
            balance,
        })
    }

    async fn lock_by_order_id(
        conn: &mut PgConnection,
        order_id: &str,
    ) -> Result<Option<TopUpRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM top_up_requests WHERE order_id = $1 FOR UPDATE");
        sqlx::query_as::<_, TopUpRequest>(&query)
            .bind(order_id)
            .fetch_optional(conn)
            .await
    }

    /// Conditional `pending -> completed` flip. Returns `None` if the row
    /// was not pending.
    async fn mark_completed(
        conn: &mut PgConnection,
        order_id: &str,
        reported_amount: Option<Amount>,
    ) -> Result<Option<TopUpRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE top_up_requests
             SET status = $2, completed_at = NOW(), reported_amount = $3
             WHERE order_id = $1 AND status = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TopUpRequest>(&query)
            .bind(order_id)
            .bind(STATUS_COMPLETED)
            .bind(reported_amount)
            .bind(STATUS_PENDING)
            .fetch_optional(conn)
            .await
    }
}
