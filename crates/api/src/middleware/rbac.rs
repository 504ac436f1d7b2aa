//! Admin authorization.
//!
//! Admin routes accept either a server-issued admin session token
//! (`Authorization: Bearer ...` with role `admin`) or the shared secret in
//! the `x-admin-secret` header. The secret is compared in constant time.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nexus_core::error::CoreError;
use nexus_core::roles::ROLE_ADMIN;
use subtle::ConstantTimeEq;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the shared admin secret.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// How the admin proved their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCredential {
    SessionToken,
    SharedSecret,
}

/// Requires admin credentials. Rejects with 401 when none are supplied and
/// 403 when they are wrong.
pub struct RequireAdmin(pub AdminCredential);

/// Constant-time comparison of a supplied secret with the configured one.
pub fn secret_matches(supplied: &str, expected: &str) -> bool {
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(supplied) = parts.headers.get(ADMIN_SECRET_HEADER) {
            let supplied = supplied.to_str().unwrap_or_default();
            if !secret_matches(supplied, &state.config.admin_secret) {
                tracing::warn!("Rejected admin request with invalid secret");
                return Err(CoreError::Forbidden("Invalid admin secret".into()).into());
            }
            return Ok(RequireAdmin(AdminCredential::SharedSecret));
        }

        if parts.headers.get("authorization").is_none() {
            return Err(CoreError::Unauthorized("Admin credentials required".into()).into());
        }

        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(CoreError::Forbidden("Admin role required".into()).into());
        }
        Ok(RequireAdmin(AdminCredential::SessionToken))
    }
}
