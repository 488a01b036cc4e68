//! Register video command
//!
//! Validates an upload, stores the bytes in the media store and records the
//! video row. Nothing is persisted when validation fails.

use bytes::Bytes;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::{validate_filename, FilenameValidationError};
use crate::features::videos::content_type::{infer_from_filename, is_video, sanitize_filename};
use crate::models::Video;
use crate::storage::{build_key, MediaStore};

#[derive(Clone)]
pub struct RegisterVideoCommand {
    pub owner: Uuid,
    pub filename: String,
    pub content: Bytes,
}

impl std::fmt::Debug for RegisterVideoCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterVideoCommand")
            .field("owner", &self.owner)
            .field("filename", &self.filename)
            .field("size", &self.content.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterVideoError {
    #[error(transparent)]
    Filename(#[from] FilenameValidationError),

    #[error("Uploaded file is empty")]
    EmptyPayload,

    #[error("Invalid video file")]
    UnsupportedType,

    #[error("Failed to store video: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RegisterVideoCommand {
    /// Returns the inferred MIME type on success.
    pub fn validate(&self) -> Result<&'static str, RegisterVideoError> {
        validate_filename(&self.filename)?;

        let mime_type = infer_from_filename(&self.filename)
            .filter(|m| is_video(m))
            .ok_or(RegisterVideoError::UnsupportedType)?;

        if self.content.is_empty() {
            return Err(RegisterVideoError::EmptyPayload);
        }

        Ok(mime_type)
    }
}

#[tracing::instrument(
    skip(pool, media, command),
    fields(owner = %command.owner, filename = %command.filename, size = command.content.len())
)]
pub async fn handle(
    pool: &PgPool,
    media: &dyn MediaStore,
    command: RegisterVideoCommand,
) -> Result<Video, RegisterVideoError> {
    let mime_type = command.validate()?;

    let stored_filename = format!(
        "{}_{}",
        Uuid::new_v4().simple(),
        sanitize_filename(&command.filename)
    );
    let key = build_key(command.owner, &stored_filename);
    let size_bytes = command.content.len() as i64;

    media
        .put(&key, command.content, mime_type)
        .await
        .map_err(|e| RegisterVideoError::Storage(format!("{:#}", e)))?;

    let inserted = sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos (user_id, stored_filename, original_filename, mime_type, size_bytes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, stored_filename, original_filename, mime_type, size_bytes, uploaded_at
        "#,
    )
    .bind(command.owner)
    .bind(&stored_filename)
    .bind(&command.filename)
    .bind(mime_type)
    .bind(size_bytes)
    .fetch_one(pool)
    .await;

    let video = match inserted {
        Ok(video) => video,
        Err(e) => {
            if let Err(cleanup) = media.delete(&key).await {
                tracing::warn!(%key, error = %cleanup, "Failed to remove orphaned video object");
            }
            return Err(e.into());
        }
    };

    tracing::info!(video_id = %video.id, %mime_type, "Video registered");

    Ok(video)
}

/// Undo a registration whose follow-up failed: drop the row, then the object.
///
/// Best effort; failures are logged, not returned.
pub async fn discard(pool: &PgPool, media: &dyn MediaStore, video: &Video) {
    if let Err(e) = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video.id)
        .execute(pool)
        .await
    {
        tracing::warn!(video_id = %video.id, error = %e, "Failed to remove video row");
    }

    let key = build_key(video.user_id, &video.stored_filename);
    if let Err(cleanup) = media.delete(&key).await {
        tracing::warn!(%key, error = %cleanup, "Failed to remove orphaned video object");
    }
}
