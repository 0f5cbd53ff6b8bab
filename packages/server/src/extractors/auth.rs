use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::error::AppError;
use crate::extractors::context::RequestContext;
use crate::state::AppState;
use crate::utils::jwt;

pub const ASSET_READ: &str = "asset:read";
pub const ASSET_WRITE: &str = "asset:write";
pub const ASSET_DELETE: &str = "asset:delete";

/// Caller identity extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Capability checks happen via `require_permission()` in the handler body.
pub struct AuthUser {
    pub subject: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Returns `Ok(())` if the caller holds the given capability, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            debug!(subject = %self.subject, permission, "Missing capability");
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token.trim(), &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            ctx.set_actor(claims.sub.as_str());
        }

        Ok(AuthUser {
            subject: claims.sub,
            permissions: claims.permissions,
        })
    }
}
