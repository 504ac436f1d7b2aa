//! Collision-resistant identifiers for top-up requests and purchase orders.
//!
//! Identifiers carry 128 random bits from the thread-local CSPRNG, so two
//! requests created in the same millisecond never share an id.

use rand::Rng;

/// Prefix for top-up request order ids sent to the payment provider.
pub const TOP_UP_PREFIX: &str = "TU-";

/// Prefix for purchase order references.
pub const ORDER_PREFIX: &str = "ORD-";

/// Number of hex characters in the random part of an id.
pub const RANDOM_HEX_LENGTH: usize = 32;

fn random_hex() -> String {
    let bits: u128 = rand::rng().random();
    format!("{bits:032x}")
}

/// Generate a fresh top-up order id, e.g. `TU-3f9c...`.
pub fn generate_top_up_order_id() -> String {
    format!("{TOP_UP_PREFIX}{}", random_hex())
}

/// Generate a fresh purchase order reference, e.g. `ORD-a01b...`.
pub fn generate_order_reference() -> String {
    format!("{ORDER_PREFIX}{}", random_hex())
}

/// Check that an externally supplied order id has the shape we generate.
///
/// Webhook payloads that fail this check are rejected without a database
/// lookup.
pub fn is_well_formed_top_up_order_id(order_id: &str) -> bool {
    order_id
        .strip_prefix(TOP_UP_PREFIX)
        .is_some_and(|hex| {
            hex.len() == RANDOM_HEX_LENGTH
                && hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        })
}
