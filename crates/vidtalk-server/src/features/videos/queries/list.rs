//! List the caller's videos, newest first

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ListVideosQuery {
    pub owner: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoSummary {
    pub id: Uuid,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListVideosError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool), fields(owner = %query.owner))]
pub async fn handle(
    pool: &PgPool,
    query: ListVideosQuery,
) -> Result<Vec<VideoSummary>, ListVideosError> {
    let videos = sqlx::query_as::<_, VideoSummary>(
        r#"
        SELECT id, original_filename, mime_type, size_bytes, uploaded_at
        FROM videos
        WHERE user_id = $1
        ORDER BY uploaded_at DESC, id
        "#,
    )
    .bind(query.owner)
    .fetch_all(pool)
    .await?;

    tracing::debug!(count = videos.len(), "Videos listed");
    Ok(videos)
}
