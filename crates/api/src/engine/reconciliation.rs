//! Payment notification handling.
//!
//! [`handle_ipn`] authenticates a raw callback body, interprets it, and for
//! finished payments runs [`apply_top_up`]. Authentication happens before
//! anything touches the database.
//!
//! [`apply_top_up`] is the single credit path for provider-backed top-ups.
//! The admin "force complete" endpoint uses it too, so every route shares
//! the same exactly-once guarantee from [`TopUpRepo::complete`].

use nexus_core::error::CoreError;
use nexus_core::ipn::{self, IpnAction};
use nexus_core::ledger::CreditSource;
use nexus_core::money::{check_reported_amount, storable_reported_amount, AmountCheck};
use nexus_core::types::Amount;
use nexus_db::models::top_up::TopUpCompletion;
use nexus_db::repositories::TopUpRepo;
use nexus_events::StoreEvent;

use crate::error::AppError;
use crate::state::AppState;

/// How a verified notification was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// The owner's balance was credited.
    Credited { order_id: String, balance: Amount },
    /// A previous delivery already credited this order.
    AlreadyProcessed { order_id: String },
    /// No request carries this order id.
    UnknownOrder { order_id: String },
    /// Payment is not finished; nothing to do yet.
    Ignored { status: String },
    /// The request's email no longer has an account. The request stays
    /// pending and the operator is alerted.
    OwnerMissing { order_id: String },
}

/// Authenticate and process one provider callback.
///
/// Errors are validation failures (400): a missing or wrong signature, or a
/// malformed payload. Storage failures propagate as database errors.
pub async fn handle_ipn(
    state: &AppState,
    raw_body: &[u8],
    signature: Option<&str>,
) -> Result<WebhookOutcome, AppError> {
    let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
        tracing::warn!("Payment notification without signature header");
        return Err(CoreError::Validation("Missing signature".into()).into());
    };

    let secret = state.config.payments.ipn_secret.as_bytes();
    if !ipn::verify_signature(secret, raw_body, signature) {
        tracing::warn!(body_len = raw_body.len(), "Payment notification with invalid signature");
        return Err(CoreError::Validation("Invalid signature".into()).into());
    }

    let payload = ipn::parse_payload(raw_body)?;
    tracing::info!(
        payment_id = ?payload.payment_id,
        status = %payload.payment_status,
        order_id = ?payload.order_id,
        "Payment notification received"
    );

    match payload.action()? {
        IpnAction::Ignore { status } => {
            tracing::debug!(%status, "Payment not finished, no balance effect");
            Ok(WebhookOutcome::Ignored { status })
        }
        IpnAction::UnknownOrder { order_id } => {
            tracing::warn!(%order_id, "Payment notification for foreign order id");
            Ok(WebhookOutcome::UnknownOrder { order_id })
        }
        IpnAction::Reconcile {
            order_id,
            reported_amount,
        } => apply_top_up(state, &order_id, reported_amount).await,
    }
}

/// Complete the top-up for `order_id` and credit its owner, at most once.
///
/// The recorded request amount is credited. `reported_amount` is stored for
/// audit when the column can hold it and a mismatch is logged.
pub async fn apply_top_up(
    state: &AppState,
    order_id: &str,
    reported_amount: Option<Amount>,
) -> Result<WebhookOutcome, AppError> {
    let audit_amount = storable_reported_amount(reported_amount);
    if let (Some(reported), None) = (reported_amount, audit_amount) {
        tracing::warn!(%order_id, %reported, "Reported amount out of range, not stored");
    }
    let completion = TopUpRepo::complete(&state.pool, order_id, audit_amount).await?;

    let outcome = match completion {
        TopUpCompletion::Credited {
            request,
            user_id,
            balance,
        } => {
            match check_reported_amount(request.amount, reported_amount) {
                AmountCheck::Match => {}
                AmountCheck::Missing => {
                    tracing::warn!(%order_id, recorded = %request.amount, "Payment notification without price_amount");
                }
                AmountCheck::Mismatch { recorded, reported } => {
                    tracing::warn!(
                        %order_id,
                        %recorded,
                        %reported,
                        "Reported amount differs from request; credited recorded amount"
                    );
                }
            }

            tracing::info!(%order_id, user_id, amount = %request.amount, %balance, "Top-up credited");
            state.event_bus.publish(StoreEvent::wallet_topped_up(
                user_id,
                &request.email,
                request.amount,
                CreditSource::Crypto.description(),
            ));
            WebhookOutcome::Credited {
                order_id: order_id.to_string(),
                balance,
            }
        }
        TopUpCompletion::AlreadyProcessed(_) => {
            tracing::info!(%order_id, "Top-up already processed");
            WebhookOutcome::AlreadyProcessed {
                order_id: order_id.to_string(),
            }
        }
        TopUpCompletion::NotFound => {
            tracing::warn!(%order_id, "No top-up request for order id");
            WebhookOutcome::UnknownOrder {
                order_id: order_id.to_string(),
            }
        }
        TopUpCompletion::OwnerMissing(request) => {
            tracing::error!(%order_id, email = %request.email, "Finished payment has no matching account");
            state.event_bus.publish(StoreEvent::top_up_unmatched_owner(
                &request.email,
                order_id,
                request.amount,
            ));
            WebhookOutcome::OwnerMissing {
                order_id: order_id.to_string(),
            }
        }
    };

    Ok(outcome)
}
