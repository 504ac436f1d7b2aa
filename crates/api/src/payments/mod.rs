//! External payment provider integration.
//!
//! - [`provider`] -- the [`PaymentProvider`] seam used by handlers.
//! - [`nowpayments`] -- the NOWPayments HTTP client.

pub mod nowpayments;
pub mod provider;

pub use provider::{Invoice, InvoiceRequest, PaymentProvider, ProviderError};
