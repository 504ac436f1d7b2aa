//! Amount validation and the webhook amount reconciliation policy.
//!
//! Every balance-affecting input (admin credit, instant top-up, crypto
//! top-up, catalog price) passes through [`validate_amount`] before it
//! reaches the database.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::types::Amount;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of fractional digits accepted for an amount.
pub const MAX_AMOUNT_DECIMALS: u32 = 2;

/// Upper bound for a single credit, debit or catalog price.
pub const MAX_SINGLE_AMOUNT: i64 = 1_000_000;

/// Default minimum for a provider-backed (crypto) top-up.
pub const DEFAULT_MIN_TOP_UP: i64 = 100;

/// Integer digits available in the `reported_amount` audit column
/// (`NUMERIC(18, 2)`).
pub const REPORTED_AMOUNT_INTEGER_DIGITS: u32 = 16;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a user- or admin-supplied amount.
///
/// The amount must be strictly positive, carry at most
/// [`MAX_AMOUNT_DECIMALS`] fractional digits and not exceed
/// [`MAX_SINGLE_AMOUNT`]. Returns the normalized value on success.
pub fn validate_amount(amount: Amount) -> Result<Amount, CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "Valid positive amount required".into(),
        ));
    }
    let normalized = amount.normalize();
    if normalized.scale() > MAX_AMOUNT_DECIMALS {
        return Err(CoreError::Validation(format!(
            "Amount must have at most {MAX_AMOUNT_DECIMALS} decimal places"
        )));
    }
    if normalized > Decimal::from(MAX_SINGLE_AMOUNT) {
        return Err(CoreError::Validation(format!(
            "Amount must not exceed {MAX_SINGLE_AMOUNT}"
        )));
    }
    Ok(normalized)
}

/// Validate a provider-backed top-up amount against the configured minimum.
pub fn validate_top_up_amount(amount: Amount, minimum: Amount) -> Result<Amount, CoreError> {
    if amount < minimum {
        return Err(CoreError::Validation(format!("Minimum top-up is {minimum}")));
    }
    validate_amount(amount)
}

// ---------------------------------------------------------------------------
// Webhook amount policy
// ---------------------------------------------------------------------------

/// Result of comparing the amount recorded at request time with the amount
/// echoed back by the payment provider.
///
/// The recorded amount is always the one credited; this only drives logging
/// and the `reported_amount` audit column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountCheck {
    Match,
    Missing,
    Mismatch { recorded: Amount, reported: Amount },
}

/// Compare a recorded top-up amount with the provider-reported one.
pub fn check_reported_amount(recorded: Amount, reported: Option<Amount>) -> AmountCheck {
    match reported {
        None => AmountCheck::Missing,
        Some(reported) if reported == recorded => AmountCheck::Match,
        Some(reported) => AmountCheck::Mismatch { recorded, reported },
    }
}

/// Fit a provider-reported amount into the audit column.
///
/// The value is rounded to [`MAX_AMOUNT_DECIMALS`]. Values the column cannot
/// hold become `None` so that an unstorable audit value never blocks the
/// credit itself.
pub fn storable_reported_amount(reported: Option<Amount>) -> Option<Amount> {
    let limit = Decimal::from(10i64.pow(REPORTED_AMOUNT_INTEGER_DIGITS));
    reported
        .map(|amount| amount.round_dp(MAX_AMOUNT_DECIMALS))
        .filter(|amount| amount.abs() < limit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
