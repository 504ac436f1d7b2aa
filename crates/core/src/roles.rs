//! Well-known role name constants carried in the JWT `role` claim.

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Subject id used for admin session tokens, which are not tied to a user row.
pub const ADMIN_SUBJECT: i64 = 0;
