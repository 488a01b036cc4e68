//! Bearer authentication extractor
//!
//! ```rust,ignore
//! async fn handler(user: AuthUser) -> impl IntoResponse {
//!     format!("hello {}", user.username)
//! }
//! ```

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::features::auth::tokens;

/// The authenticated actor of a request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    /// The presented bearer token, kept so logout can revoke it
    pub access_token: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<Self>() {
            return Ok(user.clone());
        }

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let token = bearer_token(header_value)
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let pool = PgPool::from_ref(state);
        let user = tokens::resolve(&pool, token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        tracing::debug!(user_id = %user.id, "Request authenticated");

        let auth_user = AuthUser {
            id: user.id,
            username: user.username,
            access_token: token.to_string(),
        };
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}
