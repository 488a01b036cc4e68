//! Get video query (owner-scoped)

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Video;

#[derive(Debug, Clone)]
pub struct GetVideoQuery {
    pub owner: Uuid,
    pub video_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetVideoError {
    /// Also returned for videos owned by someone else
    #[error("Video not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool), fields(owner = %query.owner, video_id = %query.video_id))]
pub async fn handle(pool: &PgPool, query: GetVideoQuery) -> Result<Video, GetVideoError> {
    sqlx::query_as::<_, Video>(
        r#"
        SELECT id, user_id, stored_filename, original_filename, mime_type, size_bytes, uploaded_at
        FROM videos
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(query.video_id)
    .bind(query.owner)
    .fetch_optional(pool)
    .await?
    .ok_or(GetVideoError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{TestUser, TestVideo};

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_owner_can_get(pool: PgPool) -> sqlx::Result<()> {
        let alice = TestUser::new("alice").insert(&pool).await?;
        let video = TestVideo::new(alice.id).insert(&pool).await?;

        let found = handle(
            &pool,
            GetVideoQuery {
                owner: alice.id,
                video_id: video.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(found.id, video.id);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_foreign_video_looks_missing(pool: PgPool) -> sqlx::Result<()> {
        let alice = TestUser::new("alice").insert(&pool).await?;
        let bob = TestUser::new("bob").insert(&pool).await?;
        let video = TestVideo::new(alice.id).insert(&pool).await?;

        let foreign = handle(
            &pool,
            GetVideoQuery {
                owner: bob.id,
                video_id: video.id,
            },
        )
        .await
        .unwrap_err();
        let missing = handle(
            &pool,
            GetVideoQuery {
                owner: bob.id,
                video_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(foreign, GetVideoError::NotFound));
        assert_eq!(foreign.to_string(), missing.to_string());

        Ok(())
    }
}
