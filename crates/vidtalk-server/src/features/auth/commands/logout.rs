//! Logout command: revoke the presented bearer token

use serde::Serialize;
use sqlx::PgPool;

use crate::features::auth::tokens;

pub struct LogoutCommand {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LogoutError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip_all)]
pub async fn handle(pool: &PgPool, command: LogoutCommand) -> Result<LogoutResponse, LogoutError> {
    let revoked = tokens::revoke(pool, &command.access_token).await?;
    tracing::debug!(revoked, "Logout processed");

    Ok(LogoutResponse {
        message: "Logged out".to_string(),
    })
}
