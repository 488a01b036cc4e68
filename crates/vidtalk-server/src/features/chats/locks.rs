//! Per-session turn serialization
//!
//! Turns on the same session run one at a time from replay through append;
//! different sessions never wait on each other. Entries are removed once the
//! last holder or waiter lets go, so the table only holds busy sessions.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session_id: Uuid) -> SessionGuard {
        let lock = self.inner.entry(session_id).or_default().clone();
        let guard = lock.lock_owned().await;

        SessionGuard {
            guard: Some(guard),
            session_id,
            locks: self.clone(),
        }
    }

    /// Number of sessions currently held or awaited
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

#[must_use = "the session is unlocked as soon as the guard is dropped"]
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    session_id: Uuid,
    locks: SessionLocks,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody is waiting.
        self.locks
            .inner
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
