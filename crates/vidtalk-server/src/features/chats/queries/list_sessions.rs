//! List the caller's chat sessions, newest first

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub owner: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionSummary {
    /// The session token
    pub session_id: String,
    pub video_id: Uuid,
    pub video_filename: String,
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListSessionsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool), fields(owner = %query.owner))]
pub async fn handle(
    pool: &PgPool,
    query: ListSessionsQuery,
) -> Result<Vec<SessionSummary>, ListSessionsError> {
    let sessions = sqlx::query_as::<_, SessionSummary>(
        r#"
        SELECT
            s.token AS session_id,
            s.video_id,
            v.original_filename AS video_filename,
            (SELECT COUNT(*) FROM chat_messages m WHERE m.session_id = s.id) AS message_count,
            s.created_at
        FROM chat_sessions s
        JOIN videos v ON v.id = s.video_id
        WHERE s.user_id = $1
        ORDER BY s.created_at DESC, s.id
        "#,
    )
    .bind(query.owner)
    .fetch_all(pool)
    .await?;

    tracing::debug!(count = sessions.len(), "Sessions listed");
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ExternalRef;
    use crate::features::chats::ledger;
    use crate::features::shared::test_helpers::{TestUser, TestVideo};

    fn handle_ref() -> ExternalRef {
        ExternalRef {
            uri: "files/x".to_string(),
            mime_type: "video/mp4".to_string(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_never_lists_other_users_sessions(pool: PgPool) -> sqlx::Result<()> {
        let alice = TestUser::new("alice").insert(&pool).await?;
        let bob = TestUser::new("bob").insert(&pool).await?;
        let alice_video = TestVideo::new(alice.id).with_filename("a.mp4").insert(&pool).await?;
        let bob_video = TestVideo::new(bob.id).with_filename("b.mp4").insert(&pool).await?;

        let own = ledger::create_session(&pool, alice.id, alice_video.id, &"1".repeat(32), &handle_ref())
            .await?;
        ledger::create_session(&pool, bob.id, bob_video.id, &"2".repeat(32), &handle_ref()).await?;
        ledger::append_exchange(&pool, own.id, "q", "a").await?;

        let sessions = handle(&pool, ListSessionsQuery { owner: alice.id }).await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, own.token);
        assert_eq!(sessions[0].video_filename, "a.mp4");
        assert_eq!(sessions[0].message_count, 2);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_newest_first(pool: PgPool) -> sqlx::Result<()> {
        let alice = TestUser::new("alice").insert(&pool).await?;
        let video = TestVideo::new(alice.id).insert(&pool).await?;

        let older = ledger::create_session(&pool, alice.id, video.id, &"3".repeat(32), &handle_ref())
            .await?;
        let newer = ledger::create_session(&pool, alice.id, video.id, &"4".repeat(32), &handle_ref())
            .await?;
        sqlx::query("UPDATE chat_sessions SET created_at = created_at - INTERVAL '1 hour' WHERE id = $1")
            .bind(older.id)
            .execute(&pool)
            .await?;

        let sessions = handle(&pool, ListSessionsQuery { owner: alice.id }).await.unwrap();
        let tokens: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();

        assert_eq!(tokens, [newer.token.as_str(), older.token.as_str()]);

        Ok(())
    }
}
