//! Register user command

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::auth::password::{CredentialError, CredentialHasher};
use crate::features::shared::error_helpers::map_unique_violation;
use crate::features::shared::validation::{
    validate_password, validate_username, PasswordValidationError, UsernameValidationError,
};
use crate::models::User;

#[derive(Clone, Deserialize)]
pub struct RegisterUserCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for RegisterUserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserCommand")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for RegisterUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterUserError {
    #[error(transparent)]
    Username(#[from] UsernameValidationError),

    #[error(transparent)]
    Password(#[from] PasswordValidationError),

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RegisterUserCommand {
    pub fn validate(&self) -> Result<(), RegisterUserError> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool, hasher, command), fields(username = %command.username))]
pub async fn handle(
    pool: &PgPool,
    hasher: &dyn CredentialHasher,
    command: RegisterUserCommand,
) -> Result<RegisterUserResponse, RegisterUserError> {
    command.validate()?;

    let password_hash = hasher.hash(&command.password).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, password_hash, created_at
        "#,
    )
    .bind(&command.username)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        map_unique_violation(
            e,
            RegisterUserError::DuplicateUsername(command.username.clone()),
            RegisterUserError::Database,
        )
    })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(user.into())
}
