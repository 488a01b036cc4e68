//! Login command: verify credentials and issue a bearer token

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::auth::password::{CredentialError, CredentialHasher};
use crate::features::auth::tokens;
use crate::models::User;

#[derive(Clone, Deserialize)]
pub struct LoginCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCommand")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Username and password are required")]
    MissingCredentials,

    /// Unknown user and wrong password are the same outcome
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, hasher, command), fields(username = %command.username))]
pub async fn handle(
    pool: &PgPool,
    hasher: &dyn CredentialHasher,
    token_ttl: Duration,
    command: LoginCommand,
) -> Result<LoginResponse, LoginError> {
    command.validate()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
    )
    .bind(&command.username)
    .fetch_optional(pool)
    .await?;

    let Some(user) = user else {
        // Same bcrypt work as a wrong password.
        hasher.verify_decoy(&command.password).await?;
        return Err(LoginError::InvalidCredentials);
    };

    if !hasher.verify(&command.password, &user.password_hash).await? {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(LoginError::InvalidCredentials);
    }

    let (access_token, expires_at) = tokens::issue(pool, user.id, token_ttl).await?;

    tracing::info!(user_id = %user.id, %expires_at, "User logged in");

    Ok(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_at,
    })
}
