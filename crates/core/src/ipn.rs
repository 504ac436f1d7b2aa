//! Payment provider instant payment notifications (IPN).
//!
//! The provider signs every callback with HMAC-SHA512 over the raw request
//! body, keyed by the shared IPN secret, and sends the lowercase hex digest
//! in the [`SIGNATURE_HEADER`] header. Verification must run over the exact
//! bytes received: re-serializing a parsed payload can reorder fields and
//! change the digest.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use sha2::Sha512;

use crate::error::CoreError;
use crate::order_id::is_well_formed_top_up_order_id;
use crate::types::Amount;

/// Header carrying the hex-encoded HMAC-SHA512 body signature.
pub const SIGNATURE_HEADER: &str = "x-nowpayments-sig";

type HmacSha512 = Hmac<Sha512>;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Compute the hex-encoded HMAC-SHA512 signature of `body`.
pub fn sign_body(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex signature against the raw body.
///
/// The digest comparison is constant-time (`Mac::verify_slice`). Signatures
/// that are not valid hex are rejected without computing a MAC.
pub fn verify_signature(secret: &[u8], body: &[u8], signature_hex: &str) -> bool {
    let Some(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string (either case). Returns `None` on odd length or
    /// non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        s.as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16)?;
                let lo = (pair[1] as char).to_digit(16)?;
                Some((hi * 16 + lo) as u8)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Fields of the provider callback this system reads. Unknown fields are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct IpnPayload {
    /// Provider payment id; numeric or string depending on provider version.
    #[serde(default)]
    pub payment_id: Option<serde_json::Value>,
    pub payment_status: String,
    /// Our order id, echoed verbatim from invoice creation.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Fiat amount of the invoice as reported by the provider (advisory).
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price_amount: Option<Amount>,
    #[serde(default)]
    pub price_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub pay_amount: Option<Amount>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub actually_paid: Option<Amount>,
    #[serde(default)]
    pub pay_currency: Option<String>,
}

/// Amounts are advisory, so a value that is not a representable decimal is
/// read as absent instead of rejecting the whole notification.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        _ => return Ok(None),
    };
    Ok(Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok())
}

/// Parse a verified raw body into an [`IpnPayload`].
pub fn parse_payload(raw: &[u8]) -> Result<IpnPayload, CoreError> {
    serde_json::from_slice(raw)
        .map_err(|e| CoreError::Validation(format!("Malformed payment notification: {e}")))
}

/// Provider-defined payment states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Waiting,
    Confirming,
    Confirmed,
    Sending,
    PartiallyPaid,
    Finished,
    Failed,
    Refunded,
    Expired,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "waiting" => Self::Waiting,
            "confirming" => Self::Confirming,
            "confirmed" => Self::Confirmed,
            "sending" => Self::Sending,
            "partially_paid" => Self::PartiallyPaid,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            "expired" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    /// Only `finished` is a terminal success that triggers a credit.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// What the reconciliation engine should do with a verified notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpnAction {
    /// Credit the top-up identified by `order_id`.
    Reconcile {
        order_id: String,
        reported_amount: Option<Amount>,
    },
    /// The order id cannot belong to us; acknowledge without a lookup.
    UnknownOrder { order_id: String },
    /// Not a terminal success; acknowledge with no balance effect.
    Ignore { status: String },
}

impl IpnPayload {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.payment_status)
    }

    /// Decide what to do with this notification.
    ///
    /// A `finished` payment without an order id is malformed and yields a
    /// validation error.
    pub fn action(&self) -> Result<IpnAction, CoreError> {
        if !self.status().is_finished() {
            return Ok(IpnAction::Ignore {
                status: self.payment_status.clone(),
            });
        }

        let order_id = self
            .order_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CoreError::Validation("Finished payment notification without order_id".into())
            })?;

        if !is_well_formed_top_up_order_id(order_id) {
            return Ok(IpnAction::UnknownOrder {
                order_id: order_id.to_string(),
            });
        }

        Ok(IpnAction::Reconcile {
            order_id: order_id.to_string(),
            reported_amount: self.price_amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
