use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::{AppError, UserRole};

use super::jwt::Claims;

/// Extractor that requires authentication. Returns 401 if no valid token.
pub struct AuthRequired(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for AuthRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthRequired)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Extractor that optionally extracts auth claims. Never fails.
pub struct MaybeAuth(pub Option<Claims>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<Claims>().cloned()))
    }
}

/// Role constants for [`RoleRequired`].
pub const MODERATOR: u8 = 1;
pub const ADMIN: u8 = 2;

/// Extractor that requires authentication AND a minimum platform role.
/// Returns 401 if unauthenticated, 403 if the role is insufficient.
///
/// - 0 = User
/// - 1 = Moderator
/// - 2 = Admin (satisfies all roles)
pub struct RoleRequired<const ROLE: u8>(pub Claims);

impl<const ROLE: u8, S: Send + Sync> FromRequestParts<S> for RoleRequired<ROLE> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        let required_role = match ROLE {
            MODERATOR => UserRole::Moderator,
            ADMIN => UserRole::Admin,
            _ => UserRole::User,
        };

        if !claims.user_role().satisfies(&required_role) {
            return Err(AppError::forbidden(format!(
                "{} role or higher required",
                required_role.as_str()
            )));
        }

        Ok(RoleRequired(claims))
    }
}
