//! Bearer access tokens
//!
//! A token is 32 random bytes, hex encoded, handed to the client once. Only
//! its SHA-256 digest is stored in `auth_tokens`.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

const ACCESS_TOKEN_BYTES: usize = 32;

pub fn generate_access_token() -> String {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Persist a fresh token for `user_id`, returning the plaintext and its expiry.
pub async fn issue(
    pool: &PgPool,
    user_id: Uuid,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>), sqlx::Error> {
    let token = generate_access_token();
    let expires_at = Utc::now() + ttl;

    sqlx::query("INSERT INTO auth_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok((token, expires_at))
}

/// The user behind a live (unexpired, unrevoked) token.
pub async fn resolve(pool: &PgPool, token: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.password_hash, u.created_at
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = $1
          AND t.revoked_at IS NULL
          AND t.expires_at > NOW()
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await
}

/// Returns whether a live token was revoked.
pub async fn revoke(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE auth_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
    )
    .bind(hash_token(token))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
