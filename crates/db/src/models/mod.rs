//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - Where a repository runs a unit of work, the outcome enum it returns

pub mod catalog;
pub mod order;
pub mod top_up;
pub mod user;
pub mod wallet_transaction;
