use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Guard run before every protected handler.
///
/// A missing header or an empty token is `Unauthorized`; a token that fails
/// signature, issuer, audience or expiry checks is `Forbidden`.
pub fn validate_bearer(header: Option<&str>, keys: &JwtKeys) -> Result<Uuid, AppError> {
    let token = header
        .and_then(|h| h.split_once(' '))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    match keys.verify(token) {
        Ok(claims) => Ok(claims.sub),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            Err(AppError::Forbidden)
        }
    }
}

/// Extracts and validates the bearer token, yielding the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        validate_bearer(header, &keys).map(AuthUser)
    }
}
