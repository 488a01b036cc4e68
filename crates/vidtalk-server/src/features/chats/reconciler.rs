//! Session reconciler
//!
//! Bridges the stateless completion service and the ledger. Opening a session
//! ingests the video once and remembers the external handle; every turn then
//! rebuilds the whole context from that handle plus the replayed ledger,
//! submits it, and appends the exchange only when the reply arrived.

use bytes::Bytes;
use rand::RngCore;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::ledger;
use super::locks::SessionLocks;
use crate::ai::{CompletionError, ExternalRef, IngestionError, MediaIngester, Turn, TurnCompleter};
use crate::models::{ChatSession, Video};
use crate::storage::{build_key, MediaStore};

const SESSION_TOKEN_BYTES: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Video not found")]
    VideoNotFound,

    #[error("Stored video is unavailable: {0}")]
    MediaUnavailable(String),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct SessionReconciler {
    pool: PgPool,
    media: Arc<dyn MediaStore>,
    ingester: Arc<dyn MediaIngester>,
    completer: Arc<dyn TurnCompleter>,
    locks: SessionLocks,
}

impl SessionReconciler {
    pub fn new(
        pool: PgPool,
        media: Arc<dyn MediaStore>,
        ingester: Arc<dyn MediaIngester>,
        completer: Arc<dyn TurnCompleter>,
        locks: SessionLocks,
    ) -> Self {
        Self {
            pool,
            media,
            ingester,
            completer,
            locks,
        }
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Open a session on `video` for `owner`.
    ///
    /// `content` is the freshly uploaded payload when there is one; otherwise
    /// the bytes are read back from the media store.
    #[tracing::instrument(skip(self, video, content), fields(%owner, video_id = %video.id))]
    pub async fn open_session(
        &self,
        owner: Uuid,
        video: &Video,
        content: Option<Bytes>,
    ) -> Result<ChatSession, ReconcileError> {
        if video.user_id != owner {
            return Err(ReconcileError::VideoNotFound);
        }

        let content = match content {
            Some(content) => content,
            None => self
                .media
                .get(&build_key(video.user_id, &video.stored_filename))
                .await
                .map_err(|e| ReconcileError::MediaUnavailable(format!("{:#}", e)))?,
        };

        let handle = self
            .ingester
            .ingest(content, &video.mime_type, &video.original_filename)
            .await?;

        let token = generate_session_token();
        let session = ledger::create_session(&self.pool, owner, video.id, &token, &handle).await?;

        tracing::info!(session_id = %session.id, media_uri = %handle.uri, "Chat session opened");

        Ok(session)
    }

    /// Run one turn: replay, complete, append. Nothing is written unless the
    /// completion succeeds.
    #[tracing::instrument(skip(self, token, message), fields(%owner, message_len = message.len()))]
    pub async fn continue_session(
        &self,
        owner: Uuid,
        token: &str,
        message: &str,
    ) -> Result<String, ReconcileError> {
        let session = ledger::resolve_session(&self.pool, owner, token)
            .await?
            .ok_or(ReconcileError::SessionNotFound)?;

        let _guard = self.locks.acquire(session.id).await;

        let history = ledger::replay(&self.pool, session.id).await?;
        let turns = context_for(&session, &history);

        let reply = self.completer.complete(&turns, message).await?;

        ledger::append_exchange(&self.pool, session.id, message, &reply).await?;

        tracing::debug!(
            session_id = %session.id,
            replayed = history.len(),
            reply_len = reply.len(),
            "Turn appended"
        );

        Ok(reply)
    }
}

/// Seed turn followed by the replayed ledger
fn context_for(session: &ChatSession, history: &[crate::models::ChatMessage]) -> Vec<Turn> {
    let seed = Turn::media(ExternalRef {
        uri: session.media_uri.clone(),
        mime_type: session.media_mime_type.clone(),
    });

    std::iter::once(seed)
        .chain(history.iter().map(|m| Turn::text(m.role, m.content.clone())))
        .collect()
}

pub(crate) fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
