//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- HS256 session tokens for users and admins.

pub mod jwt;
pub mod password;
