//! Wallet reconciliation: applying verified payment notifications to
//! top-up requests and balances.

pub mod reconciliation;

pub use reconciliation::{apply_top_up, handle_ipn, WebhookOutcome};
