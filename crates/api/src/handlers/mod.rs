pub mod account;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod payments;
pub mod wallet;

use nexus_core::error::CoreError;

/// Reject a blank required string field with `message`.
pub(crate) fn require(value: &str, message: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(message.to_string()));
    }
    Ok(())
}
