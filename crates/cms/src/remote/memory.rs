//! In-memory remote store.
//!
//! Backs the integration tests and local development without a database.
//! Behaves like the real backend: the watch receiver holds the last known
//! document, upserts shallow-merge at the top level, and every write fans
//! out to all subscribers (including the writer's own process).

use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;

use super::{JsonObject, RemoteError, RemoteStore};
use crate::BoxFuture;

/// A process-local stand-in for the remote persistence backend.
#[derive(Debug)]
pub struct InMemoryRemote {
    state: Mutex<Option<JsonObject>>,
    tx: watch::Sender<Option<JsonObject>>,
    offline: AtomicBool,
}

impl InMemoryRemote {
    /// An empty remote: no document exists yet, as on first tenant boot.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            state: Mutex::new(None),
            tx,
            offline: AtomicBool::new(false),
        }
    }

    /// A remote that already holds a document.
    #[must_use]
    pub fn with_document(doc: JsonObject) -> Self {
        let (tx, _rx) = watch::channel(Some(doc.clone()));
        Self {
            state: Mutex::new(Some(doc)),
            tx,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the backend becoming unreachable: subsequent upserts fail
    /// with [`RemoteError::Unavailable`] until turned back on.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// The currently stored document, if any.
    #[must_use]
    pub fn document(&self) -> Option<JsonObject> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Push a document change as if another session had written it.
    pub fn push_remote_change(&self, doc: JsonObject) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(doc.clone());
        self.tx.send_replace(Some(doc));
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for InMemoryRemote {
    fn watch(&self) -> watch::Receiver<Option<JsonObject>> {
        self.tx.subscribe()
    }

    fn upsert(&self, partial: JsonObject) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async move {
            if self.offline.load(Ordering::SeqCst) {
                return Err(RemoteError::Unavailable(
                    "in-memory remote is offline".to_string(),
                ));
            }

            let snapshot = {
                let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                let doc = state.get_or_insert_with(JsonObject::new);
                for (key, value) in partial {
                    doc.insert(key, value);
                }
                state.clone()
            };
            self.tx.send_replace(snapshot);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: serde_json::Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_upsert_merges_top_level() {
        let remote = InMemoryRemote::new();
        remote.upsert(obj(json!({"a": 1, "b": 2}))).await.unwrap();
        remote.upsert(obj(json!({"b": 3}))).await.unwrap();

        let doc = remote.document().unwrap();
        assert_eq!(doc.get("a"), Some(&json!(1)));
        assert_eq!(doc.get("b"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_watch_observes_writes() {
        let remote = InMemoryRemote::new();
        let mut rx = remote.watch();
        assert!(rx.borrow_and_update().is_none());

        remote.upsert(obj(json!({"a": 1}))).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());
    }

    #[tokio::test]
    async fn test_offline_upsert_fails_without_mutating() {
        let remote = InMemoryRemote::new();
        remote.set_offline(true);

        let err = remote.upsert(obj(json!({"a": 1}))).await.unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert!(remote.document().is_none());
    }
}
