//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- claims from a JWT Bearer token.
//! - [`auth::ActiveUser`] -- the caller's user row, rejecting frozen accounts.
//! - [`rbac::RequireAdmin`] -- an admin session token or the admin secret header.

pub mod auth;
pub mod rbac;
