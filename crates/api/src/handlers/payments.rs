//! Handlers for `/api/payments`: crypto top-up creation and the provider
//! callback.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use nexus_core::error::CoreError;
use nexus_core::ipn::SIGNATURE_HEADER;
use nexus_core::money::validate_top_up_amount;
use nexus_core::order_id::generate_top_up_order_id;
use nexus_core::types::Amount;
use nexus_core::validation::validate_email;
use nexus_db::models::top_up::CreateTopUpRequest;
use nexus_db::repositories::{TopUpRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::engine::{handle_ipn, WebhookOutcome};
use crate::error::AppResult;
use crate::payments::InvoiceRequest;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/payments/create-payment`.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub email: String,
    /// Cryptocurrency to pay with; the configured default when absent.
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub order_id: String,
    pub address: String,
    pub currency: String,
    pub amount_to_send: Option<Amount>,
    pub invoice_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/payments/create-payment
///
/// Record a pending top-up under a fresh order id, then ask the provider for
/// deposit instructions. If the provider call fails the request stays
/// pending and the caller receives 502.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(input): Json<CreatePaymentRequest>,
) -> AppResult<Json<CreatePaymentResponse>> {
    let amount = input
        .amount
        .ok_or_else(|| CoreError::Validation("Amount required".into()))?;
    let amount = validate_top_up_amount(amount, state.config.min_top_up_amount)?;

    if input.email.trim().is_empty() {
        return Err(CoreError::Validation("User email required".into()).into());
    }
    let email = validate_email(&input.email)?;

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &email))?;
    if user.frozen {
        return Err(CoreError::Forbidden("Account frozen".into()).into());
    }

    let pay_currency = input
        .currency
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.config.payments.default_pay_currency.clone());

    let order_id = generate_top_up_order_id();
    TopUpRepo::create(
        &state.pool,
        &CreateTopUpRequest {
            order_id: order_id.clone(),
            email: email.clone(),
            amount,
        },
    )
    .await?;
    tracing::info!(%order_id, %email, %amount, %pay_currency, "Top-up request created");

    let invoice_request = InvoiceRequest {
        order_id: order_id.clone(),
        price_amount: amount,
        pay_currency: pay_currency.clone(),
        description: format!("Wallet top-up {order_id}"),
    };

    let invoice = state
        .payments
        .create_invoice(&invoice_request)
        .await
        .map_err(|e| {
            tracing::error!(%order_id, error = %e, "Invoice creation failed; request left pending");
            CoreError::Upstream(e.to_string())
        })?;

    TopUpRepo::attach_invoice(
        &state.pool,
        &order_id,
        invoice.provider_payment_id.as_deref(),
        &invoice.pay_currency,
    )
    .await?;

    Ok(Json(CreatePaymentResponse {
        order_id,
        address: invoice.pay_address,
        currency: invoice.pay_currency,
        amount_to_send: invoice.pay_amount,
        invoice_url: invoice.invoice_url,
    }))
}

/// POST /api/payments/webhook
///
/// Provider callback. The body is taken as raw bytes so the signature is
/// checked against exactly what was sent.
///
/// Responds `200 OK` whenever the provider should stop retrying (credited,
/// duplicate, unknown order, non-final status) and `404` when the payment is
/// genuine but its owner is gone.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, &'static str)> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    match handle_ipn(&state, &body, signature).await? {
        WebhookOutcome::OwnerMissing { .. } => Ok((StatusCode::NOT_FOUND, "User not found")),
        _ => Ok((StatusCode::OK, "OK")),
    }
}
