//! Conversation ledger: durable, ordered chat transcripts
//!
//! The ledger is the only memory a conversation has. Rows are append-only
//! and replay in `(created_at, id)` order.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::ai::ExternalRef;
use crate::models::{ChatMessage, ChatSession, Role};

const MESSAGE_COLUMNS: &str = "id, session_id, role, content, created_at";
const SESSION_COLUMNS: &str =
    "id, user_id, video_id, token, media_uri, media_mime_type, created_at";

pub async fn append<'e, E>(
    executor: E,
    session_id: Uuid,
    role: Role,
    content: &str,
) -> Result<ChatMessage, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ChatMessage>(&format!(
        "INSERT INTO chat_messages (session_id, role, content) VALUES ($1, $2, $3) RETURNING {}",
        MESSAGE_COLUMNS
    ))
    .bind(session_id)
    .bind(role)
    .bind(content)
    .fetch_one(executor)
    .await
}

/// Append a user turn and the model's reply atomically.
pub async fn append_exchange(
    pool: &PgPool,
    session_id: Uuid,
    user_text: &str,
    model_text: &str,
) -> Result<(ChatMessage, ChatMessage), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user = append(&mut *tx, session_id, Role::User, user_text).await?;
    let model = append(&mut *tx, session_id, Role::Model, model_text).await?;

    tx.commit().await?;

    Ok((user, model))
}

pub async fn replay(pool: &PgPool, session_id: Uuid) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {} FROM chat_messages WHERE session_id = $1 ORDER BY created_at ASC, id ASC",
        MESSAGE_COLUMNS
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await
}

pub async fn create_session(
    pool: &PgPool,
    owner: Uuid,
    video_id: Uuid,
    token: &str,
    media: &ExternalRef,
) -> Result<ChatSession, sqlx::Error> {
    sqlx::query_as::<_, ChatSession>(&format!(
        r#"
        INSERT INTO chat_sessions (user_id, video_id, token, media_uri, media_mime_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .bind(owner)
    .bind(video_id)
    .bind(token)
    .bind(&media.uri)
    .bind(&media.mime_type)
    .fetch_one(pool)
    .await
}

/// Look a session up by token, only if `owner` owns it.
pub async fn resolve_session(
    pool: &PgPool,
    owner: Uuid,
    token: &str,
) -> Result<Option<ChatSession>, sqlx::Error> {
    sqlx::query_as::<_, ChatSession>(&format!(
        "SELECT {} FROM chat_sessions WHERE token = $1 AND user_id = $2",
        SESSION_COLUMNS
    ))
    .bind(token)
    .bind(owner)
    .fetch_optional(pool)
    .await
}
