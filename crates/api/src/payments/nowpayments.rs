//! NOWPayments invoice client.
//!
//! Creates a payment with `POST {api_url}/payment`, authenticated by the
//! `x-api-key` header. The provider later calls
//! `{public_base_url}/api/payments/webhook` with an HMAC-signed status update
//! carrying our `order_id`.

use std::time::Duration;

use async_trait::async_trait;
use nexus_core::types::Amount;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{Invoice, InvoiceRequest, PaymentProvider, ProviderError};

/// Fiat currency all invoices are priced in.
pub const PRICE_CURRENCY: &str = "usd";

/// Path the provider posts status updates to, relative to the public base URL.
pub const WEBHOOK_PATH: &str = "/api/payments/webhook";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// NOWPayments settings.
#[derive(Debug, Clone)]
pub struct NowPaymentsConfig {
    pub api_url: String,
    pub api_key: String,
    /// Shared secret keying the callback HMAC.
    pub ipn_secret: String,
    /// Externally reachable base URL of this server.
    pub public_base_url: String,
    /// Storefront URL used for the success/cancel redirects.
    pub frontend_url: String,
    pub default_pay_currency: String,
    pub timeout_secs: u64,
}

impl NowPaymentsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                          | Required | Default                          |
    /// |----------------------------------|----------|----------------------------------|
    /// | `NOWPAYMENTS_API_KEY`            | **yes**  | --                               |
    /// | `NOWPAYMENTS_IPN_SECRET`         | **yes**  | --                               |
    /// | `NOWPAYMENTS_API_URL`            | no       | `https://api.nowpayments.io/v1`  |
    /// | `PUBLIC_BASE_URL`                | no       | `http://localhost:5000`          |
    /// | `FRONTEND_URL`                   | no       | `http://localhost:5173`          |
    /// | `DEFAULT_PAY_CURRENCY`           | no       | `usdttrc20`                      |
    /// | `PAYMENT_PROVIDER_TIMEOUT_SECS`  | no       | `15`                             |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or empty.
    pub fn from_env() -> Self {
        let api_key = std::env::var("NOWPAYMENTS_API_KEY")
            .expect("NOWPAYMENTS_API_KEY must be set in the environment");
        let ipn_secret = std::env::var("NOWPAYMENTS_IPN_SECRET")
            .expect("NOWPAYMENTS_IPN_SECRET must be set in the environment");
        assert!(!ipn_secret.is_empty(), "NOWPAYMENTS_IPN_SECRET must not be empty");

        let timeout_secs: u64 = std::env::var("PAYMENT_PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("PAYMENT_PROVIDER_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url: std::env::var("NOWPAYMENTS_API_URL")
                .unwrap_or_else(|_| "https://api.nowpayments.io/v1".into()),
            api_key,
            ipn_secret,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            default_pay_currency: std::env::var("DEFAULT_PAY_CURRENCY")
                .unwrap_or_else(|_| "usdttrc20".into()),
            timeout_secs,
        }
    }

    pub fn callback_url(&self) -> String {
        format!("{}{WEBHOOK_PATH}", self.public_base_url.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The subset of the create-payment response we use.
#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    #[serde(default)]
    payment_id: Option<Value>,
    pay_address: Option<String>,
    pay_currency: Option<String>,
    #[serde(default)]
    pay_amount: Option<Amount>,
    #[serde(default)]
    invoice_url: Option<String>,
}

/// Render a provider id that may arrive as a JSON number or string.
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the NOWPayments API.
pub struct NowPaymentsClient {
    client: reqwest::Client,
    config: NowPaymentsConfig,
}

impl NowPaymentsClient {
    pub fn new(config: NowPaymentsConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// JSON body for `POST /payment`. The provider expects a numeric
    /// `price_amount`.
    pub fn payment_body(&self, request: &InvoiceRequest) -> Value {
        let frontend = self.config.frontend_url.trim_end_matches('/');
        json!({
            "price_amount": request.price_amount.to_f64(),
            "price_currency": PRICE_CURRENCY,
            "pay_currency": request.pay_currency,
            "ipn_callback_url": self.config.callback_url(),
            "order_id": request.order_id,
            "order_description": request.description,
            "success_url": format!("{frontend}/success"),
            "cancel_url": format!("{frontend}/cancel"),
        })
    }
}

#[async_trait]
impl PaymentProvider for NowPaymentsClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, ProviderError> {
        let url = format!("{}/payment", self.config.api_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&self.payment_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CreatePaymentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let pay_address = parsed
            .pay_address
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("missing pay_address".into()))?;

        Ok(Invoice {
            provider_payment_id: parsed.payment_id.as_ref().and_then(id_to_string),
            pay_address,
            pay_currency: parsed
                .pay_currency
                .unwrap_or_else(|| request.pay_currency.clone()),
            pay_amount: parsed.pay_amount,
            invoice_url: parsed.invoice_url,
        })
    }
}
