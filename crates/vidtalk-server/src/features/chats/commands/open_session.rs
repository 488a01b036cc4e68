//! Open session command
//!
//! Either registers a freshly uploaded video or looks up one the caller
//! already owns, then opens a chat session on it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::chats::reconciler::{ReconcileError, SessionReconciler};
use crate::features::videos::commands::{register, RegisterVideoCommand, RegisterVideoError};
use crate::features::videos::queries::{get, GetVideoError, GetVideoQuery};
use crate::storage::MediaStore;

#[derive(Clone)]
pub enum VideoSource {
    Upload { filename: String, content: Bytes },
    Existing(Uuid),
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoSource::Upload { filename, content } => f
                .debug_struct("Upload")
                .field("filename", filename)
                .field("size", &content.len())
                .finish(),
            VideoSource::Existing(id) => f.debug_tuple("Existing").field(id).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenSessionCommand {
    pub owner: Uuid,
    pub source: VideoSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    pub message: String,
    pub session_id: String,
    pub video_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenSessionError {
    #[error(transparent)]
    Register(#[from] RegisterVideoError),

    #[error(transparent)]
    Video(#[from] GetVideoError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[tracing::instrument(skip(pool, media, reconciler, command), fields(owner = %command.owner))]
pub async fn handle(
    pool: &PgPool,
    media: &dyn MediaStore,
    reconciler: &SessionReconciler,
    command: OpenSessionCommand,
) -> Result<OpenSessionResponse, OpenSessionError> {
    let owner = command.owner;

    let (video, content, fresh) = match command.source {
        VideoSource::Upload { filename, content } => {
            let video = register::handle(
                pool,
                media,
                RegisterVideoCommand {
                    owner,
                    filename,
                    content: content.clone(),
                },
            )
            .await?;
            (video, Some(content), true)
        }
        VideoSource::Existing(video_id) => {
            let video = get::handle(pool, GetVideoQuery { owner, video_id }).await?;
            (video, None, false)
        }
    };

    let session = match reconciler.open_session(owner, &video, content).await {
        Ok(session) => session,
        Err(e) => {
            // A fresh upload that never got a session is not kept.
            if fresh {
                register::discard(pool, media, &video).await;
            }
            return Err(e.into());
        }
    };

    Ok(OpenSessionResponse {
        message: "Video uploaded successfully".to_string(),
        session_id: session.token,
        video_id: video.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{
        reconciler, EchoCompleter, InMemoryMediaStore, RecordingIngester, TestUser, SAMPLE_VIDEO,
    };
    use std::sync::Arc;

    fn upload(filename: &str) -> VideoSource {
        VideoSource::Upload {
            filename: filename.to_string(),
            content: Bytes::from_static(SAMPLE_VIDEO),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_upload_then_reuse(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("alice").insert(&pool).await?;
        let media = Arc::new(InMemoryMediaStore::default());
        let ingester = Arc::new(RecordingIngester::default());
        let sessions = reconciler(
            &pool,
            media.clone(),
            ingester.clone(),
            Arc::new(EchoCompleter::default()),
        );

        let uploaded = handle(
            &pool,
            media.as_ref(),
            &sessions,
            OpenSessionCommand {
                owner: user.id,
                source: upload("clip.mp4"),
            },
        )
        .await
        .unwrap();

        let reused = handle(
            &pool,
            media.as_ref(),
            &sessions,
            OpenSessionCommand {
                owner: user.id,
                source: VideoSource::Existing(uploaded.video_id),
            },
        )
        .await
        .unwrap();

        assert_eq!(uploaded.message, "Video uploaded successfully");
        assert_eq!(reused.video_id, uploaded.video_id);
        assert_ne!(reused.session_id, uploaded.session_id);
        assert_eq!(media.object_count(), 1);

        // Both opens submitted the same bytes.
        let calls = ingester.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, size)| *size == SAMPLE_VIDEO.len()));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_invalid_upload_opens_nothing(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("alice").insert(&pool).await?;
        let media = Arc::new(InMemoryMediaStore::default());
        let ingester = Arc::new(RecordingIngester::default());
        let sessions = reconciler(
            &pool,
            media.clone(),
            ingester.clone(),
            Arc::new(EchoCompleter::default()),
        );

        let err = handle(
            &pool,
            media.as_ref(),
            &sessions,
            OpenSessionCommand {
                owner: user.id,
                source: upload("notes.txt"),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            OpenSessionError::Register(RegisterVideoError::UnsupportedType)
        ));
        assert!(ingester.calls().is_empty());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_foreign_video_id_is_not_found(pool: PgPool) -> sqlx::Result<()> {
        let alice = TestUser::new("alice").insert(&pool).await?;
        let bob = TestUser::new("bob").insert(&pool).await?;
        let media = Arc::new(InMemoryMediaStore::default());
        let sessions = reconciler(
            &pool,
            media.clone(),
            Arc::new(RecordingIngester::default()),
            Arc::new(EchoCompleter::default()),
        );

        let uploaded = handle(
            &pool,
            media.as_ref(),
            &sessions,
            OpenSessionCommand {
                owner: alice.id,
                source: upload("clip.mp4"),
            },
        )
        .await
        .unwrap();

        let err = handle(
            &pool,
            media.as_ref(),
            &sessions,
            OpenSessionCommand {
                owner: bob.id,
                source: VideoSource::Existing(uploaded.video_id),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, OpenSessionError::Video(GetVideoError::NotFound)));

        Ok(())
    }

    async fn video_count(pool: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(pool)
            .await
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_ingestion_failure_discards_fresh_upload(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("alice").insert(&pool).await?;
        let media = Arc::new(InMemoryMediaStore::default());
        let sessions = reconciler(
            &pool,
            media.clone(),
            Arc::new(RecordingIngester::failing()),
            Arc::new(EchoCompleter::default()),
        );

        let err = handle(
            &pool,
            media.as_ref(),
            &sessions,
            OpenSessionCommand {
                owner: user.id,
                source: upload("clip.mp4"),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            OpenSessionError::Reconcile(ReconcileError::Ingestion(_))
        ));
        assert_eq!(video_count(&pool).await?, 0);
        assert_eq!(media.object_count(), 0);

        let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&pool)
            .await?;
        assert_eq!(sessions, 0);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_ingestion_failure_keeps_existing_video(pool: PgPool) -> sqlx::Result<()> {
        let user = TestUser::new("alice").insert(&pool).await?;
        let media = Arc::new(InMemoryMediaStore::default());
        let working = reconciler(
            &pool,
            media.clone(),
            Arc::new(RecordingIngester::default()),
            Arc::new(EchoCompleter::default()),
        );
        let uploaded = handle(
            &pool,
            media.as_ref(),
            &working,
            OpenSessionCommand {
                owner: user.id,
                source: upload("clip.mp4"),
            },
        )
        .await
        .unwrap();

        let failing = reconciler(
            &pool,
            media.clone(),
            Arc::new(RecordingIngester::failing()),
            Arc::new(EchoCompleter::default()),
        );
        let err = handle(
            &pool,
            media.as_ref(),
            &failing,
            OpenSessionCommand {
                owner: user.id,
                source: VideoSource::Existing(uploaded.video_id),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, OpenSessionError::Reconcile(_)));
        assert_eq!(video_count(&pool).await?, 1);
        assert_eq!(media.object_count(), 1);

        Ok(())
    }
}
