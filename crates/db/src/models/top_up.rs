//! Top-up request entity, DTOs and the completion outcome.

use nexus_core::top_up::TopUpStatus;
use nexus_core::types::{Amount, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `top_up_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub id: DbId,
    pub order_id: String,
    pub email: String,
    pub amount: Amount,
    pub status: String,
    pub pay_currency: Option<String>,
    pub provider_payment_id: Option<String>,
    pub reported_amount: Option<Amount>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TopUpRequest {
    /// Parsed status. The CHECK constraint guarantees a known value.
    pub fn status(&self) -> TopUpStatus {
        TopUpStatus::from_str_value(&self.status).unwrap_or(TopUpStatus::Pending)
    }
}

/// DTO for creating a pending top-up request.
#[derive(Debug)]
pub struct CreateTopUpRequest {
    pub order_id: String,
    pub email: String,
    pub amount: Amount,
}

/// Result of the completion unit of work for one order id.
#[derive(Debug)]
pub enum TopUpCompletion {
    /// The owner's balance was credited and the request flipped to `completed`.
    Credited {
        request: TopUpRequest,
        user_id: DbId,
        balance: Amount,
    },
    /// The request was already `completed`; nothing changed.
    AlreadyProcessed(TopUpRequest),
    /// No request with that order id exists; nothing changed.
    NotFound,
    /// The request's email no longer resolves to a user; the request stays
    /// `pending` and nothing changed.
    OwnerMissing(TopUpRequest),
}
