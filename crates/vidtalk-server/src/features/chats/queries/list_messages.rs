//! Transcript of one session, owner-checked

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::chats::ledger;
use crate::models::{ChatMessage, Role};

#[derive(Clone)]
pub struct ListMessagesQuery {
    pub owner: Uuid,
    pub session_id: String,
}

impl std::fmt::Debug for ListMessagesQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListMessagesQuery")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListMessagesError {
    /// Unknown and foreign sessions alike
    #[error("Session not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, query), fields(owner = %query.owner))]
pub async fn handle(
    pool: &PgPool,
    query: ListMessagesQuery,
) -> Result<Vec<MessageView>, ListMessagesError> {
    let session = ledger::resolve_session(pool, query.owner, &query.session_id)
        .await?
        .ok_or(ListMessagesError::NotFound)?;

    let messages = ledger::replay(pool, session.id).await?;

    Ok(messages.into_iter().map(MessageView::from).collect())
}
