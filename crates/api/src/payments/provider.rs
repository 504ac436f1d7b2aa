//! Provider-agnostic invoice creation.

use async_trait::async_trait;
use nexus_core::types::Amount;
use serde::Serialize;

/// Error type for invoice creation failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The provider answered 2xx with an unusable body.
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// What we ask the provider to bill.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    /// Our correlation key, echoed back verbatim in the callback.
    pub order_id: String,
    /// Fiat amount (USD).
    pub price_amount: Amount,
    /// Cryptocurrency the payer will send.
    pub pay_currency: String,
    pub description: String,
}

/// Deposit instructions returned by the provider.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub provider_payment_id: Option<String>,
    pub pay_address: String,
    pub pay_currency: String,
    pub pay_amount: Option<Amount>,
    pub invoice_url: Option<String>,
}

/// An external service that turns an order into deposit instructions.
///
/// Calls must be time-bounded by the implementation.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, ProviderError>;
}
