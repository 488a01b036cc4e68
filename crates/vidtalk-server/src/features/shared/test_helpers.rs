//! Test fixtures and collaborator stubs
//!
//! ```rust,ignore
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_something(pool: PgPool) -> sqlx::Result<()> {
//!     let user = TestUser::new("alice").insert(&pool).await?;
//!     let video = TestVideo::new(user.id).insert(&pool).await?;
//!     // ... test logic ...
//!     Ok(())
//! }
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::ai::{
    CompletionError, ExternalRef, IngestionError, MediaIngester, Turn, TurnCompleter,
};
use crate::features::chats::{SessionLocks, SessionReconciler};
use crate::models::{User, Video};
use crate::storage::MediaStore;

/// Builder for test users; the password is always [`TestUser::PASSWORD`].
#[derive(Debug, Clone)]
pub struct TestUser {
    pub username: String,
}

impl TestUser {
    pub const PASSWORD: &'static str = "password123";

    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<User> {
        let password_hash = bcrypt::hash(Self::PASSWORD, 4).expect("bcrypt hash");

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(&self.username)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }
}

/// Builder for video rows (metadata only; pair with [`InMemoryMediaStore::put`] for bytes).
#[derive(Debug, Clone)]
pub struct TestVideo {
    pub owner: Uuid,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

impl TestVideo {
    pub fn new(owner: Uuid) -> Self {
        Self {
            owner,
            original_filename: "clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            size_bytes: SAMPLE_VIDEO.len() as i64,
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.original_filename = filename.to_string();
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Video> {
        let stored_filename = format!("{}_{}", Uuid::new_v4().simple(), self.original_filename);

        sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (user_id, stored_filename, original_filename, mime_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, stored_filename, original_filename, mime_type, size_bytes, uploaded_at
            "#,
        )
        .bind(self.owner)
        .bind(stored_filename)
        .bind(self.original_filename)
        .bind(self.mime_type)
        .bind(self.size_bytes)
        .fetch_one(pool)
        .await
    }
}

pub const SAMPLE_VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42 not really a video";

/// Media store backed by a map
#[derive(Default)]
pub struct InMemoryMediaStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl InMemoryMediaStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no object at {}", key))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Hands out `files/test-<n>` handles and remembers what it was given.
#[derive(Default)]
pub struct RecordingIngester {
    calls: Mutex<Vec<(String, usize)>>,
    fail: bool,
}

impl RecordingIngester {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// `(display_name, size)` of every ingest call
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaIngester for RecordingIngester {
    async fn ingest(
        &self,
        content: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<ExternalRef, IngestionError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((display_name.to_string(), content.len()));
            calls.len()
        };

        if self.fail {
            return Err(IngestionError::ProcessingFailed {
                name: format!("files/test-{}", n),
            });
        }

        Ok(ExternalRef {
            uri: format!("files/test-{}", n),
            mime_type: mime_type.to_string(),
        })
    }
}

/// Replies `echo: <message>` and records the history it was given.
#[derive(Default)]
pub struct EchoCompleter {
    seen: Mutex<Vec<Vec<Turn>>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl EchoCompleter {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn histories(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }

    /// Highest number of overlapping `complete` calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TurnCompleter for EchoCompleter {
    async fn complete(&self, history: &[Turn], message: &str) -> Result<String, CompletionError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.seen.lock().unwrap().push(history.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("echo: {}", message))
    }
}

/// Always times out.
#[derive(Default)]
pub struct FailingCompleter;

#[async_trait]
impl TurnCompleter for FailingCompleter {
    async fn complete(&self, _history: &[Turn], _message: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Timeout)
    }
}

/// A reconciler over the given stubs and a fresh lock table
pub fn reconciler(
    pool: &PgPool,
    media: Arc<InMemoryMediaStore>,
    ingester: Arc<dyn MediaIngester>,
    completer: Arc<dyn TurnCompleter>,
) -> SessionReconciler {
    SessionReconciler::new(pool.clone(), media, ingester, completer, SessionLocks::default())
}
