//! Nexus storefront domain logic.
//!
//! This crate has no database or HTTP dependencies. Everything here is pure
//! computation over values passed in by the caller, so it can be shared by
//! the repository layer, the API server and the test suites.

pub mod error;
pub mod ipn;
pub mod ledger;
pub mod money;
pub mod order_id;
pub mod roles;
pub mod top_up;
pub mod types;
pub mod validation;
