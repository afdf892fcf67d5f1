//! The canonical in-memory configuration document.
//!
//! Exactly one `ConfigStore` exists per process per tenant. It owns the
//! canonical [`SiteConfiguration`], reconciles it with the remote store, and
//! notifies subscribers on every change through a `watch` channel.
//!
//! # Update semantics
//!
//! [`ConfigStore::update`] performs a **shallow top-level merge**: each
//! top-level key present in the partial fully replaces the corresponding
//! canonical key. Callers changing one field of a nested record send the
//! whole record. The local merge and the listener notification happen
//! synchronously; the same partial is then forwarded to the remote through
//! a single persistence task, so upserts reach the backend in call order.
//! Readers see the edit before the network round-trip resolves, and a
//! failed upsert never rolls the local state back.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use velluto_core::SiteConfiguration;

use crate::remote::{JsonObject, RemoteError, RemoteStore};

/// A local update that could not be applied. The canonical document is
/// untouched when this is returned.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The merged document no longer fits the configuration schema.
    #[error("partial does not fit the document schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// What subscribers observe: the current document plus whether the first
/// remote reconciliation has completed.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// True until the store has either adopted the remote document or seeded
    /// the remote with the default.
    pub loading: bool,
    /// The canonical document. Shared, never mutated in place.
    pub config: Arc<SiteConfiguration>,
}

/// Handle on the background persistence of one local update.
///
/// The local merge is already applied and visible when a `Commit` is
/// returned. Await [`Commit::confirmed`] for the remote acknowledgment, or
/// drop the handle for fire-and-forget (the upsert still runs).
#[derive(Debug)]
pub struct Commit {
    ack: oneshot::Receiver<Result<(), RemoteError>>,
}

impl Commit {
    /// Wait for the remote acknowledgment of this update.
    ///
    /// # Errors
    ///
    /// Returns the [`RemoteError`] the queued upsert failed with. The local
    /// state keeps the update regardless.
    pub async fn confirmed(self) -> Result<(), RemoteError> {
        self.ack
            .await
            .unwrap_or_else(|_| Err(RemoteError::Backend(PERSIST_STOPPED.to_string())))
    }

    /// Explicitly let the persistence run in the background.
    pub fn detach(self) {}
}

const PERSIST_STOPPED: &str = "persistence task stopped";

type PersistJob = (JsonObject, oneshot::Sender<Result<(), RemoteError>>);

struct Canonical {
    loading: bool,
    config: Arc<SiteConfiguration>,
}

/// The canonical configuration document for one tenant.
pub struct ConfigStore {
    remote: Arc<dyn RemoteStore>,
    canonical: Mutex<Canonical>,
    tx: watch::Sender<ConfigSnapshot>,
    persist_tx: mpsc::UnboundedSender<PersistJob>,
}

impl ConfigStore {
    /// Create a store holding the hard-coded default document, not yet
    /// reconciled with the remote ([`ConfigStore::spawn_sync`] does that).
    ///
    /// Must be called within a Tokio runtime: the persistence task that
    /// forwards local updates to the remote in call order is spawned here.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>) -> Arc<Self> {
        let config = Arc::new(SiteConfiguration::default());
        let snapshot = ConfigSnapshot {
            loading: true,
            config: Arc::clone(&config),
        };
        let (tx, _rx) = watch::channel(snapshot);
        let persist_tx = spawn_persist_task(Arc::clone(&remote));

        Arc::new(Self {
            remote,
            canonical: Mutex::new(Canonical {
                loading: true,
                config,
            }),
            tx,
            persist_tx,
        })
    }

    /// Register for change notification.
    ///
    /// The receiver immediately holds the current snapshot and observes
    /// every subsequent change (remote push or local update). Use
    /// `Receiver::wait_for(|s| !s.loading)` to block until the first
    /// reconciliation completes; dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConfigSnapshot> {
        self.tx.subscribe()
    }

    /// The current canonical document.
    #[must_use]
    pub fn current(&self) -> Arc<SiteConfiguration> {
        Arc::clone(&self.lock().config)
    }

    /// The current canonical document as a JSON object (its wire shape).
    #[must_use]
    pub fn current_object(&self) -> JsonObject {
        to_object(&self.current())
    }

    /// Whether the first remote reconciliation is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Apply a structurally-partial update: shallow top-level merge, local
    /// first, remote in the background.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Schema`] if the merged document would not fit
    /// the configuration schema; the canonical document is untouched in that
    /// case and nothing is sent upstream.
    pub fn update(&self, partial: JsonObject) -> Result<Commit, UpdateError> {
        {
            let mut canonical = self.lock();
            let mut merged = to_object(&canonical.config);
            for (key, value) in partial.clone() {
                merged.insert(key, value);
            }
            // Validate before touching any state: an invalid partial must
            // leave the canonical document exactly as it was.
            let next: SiteConfiguration = serde_json::from_value(Value::Object(merged))?;

            canonical.config = Arc::new(next);
            self.tx.send_replace(ConfigSnapshot {
                loading: canonical.loading,
                config: Arc::clone(&canonical.config),
            });
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self.persist_tx.send((partial, ack_tx)).is_err() {
            tracing::error!("{PERSIST_STOPPED}; local update not forwarded to the remote");
        }

        Ok(Commit { ack: ack_rx })
    }

    /// Commit a full document (every top-level key replaced). Used by the
    /// editor surface to commit its working copy.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::update`].
    pub fn replace(&self, document: &SiteConfiguration) -> Result<Commit, UpdateError> {
        self.update(to_object(document))
    }

    /// Start the reconciliation loop against the remote store.
    ///
    /// On the first remote callback, a present document is adopted (remote
    /// fields win over the default at the top level; fields the remote never
    /// persisted keep their defaults) and `loading` clears. An absent
    /// document causes the current in-memory state to be pushed upstream as
    /// the seed. Two clients booting concurrently against an empty remote
    /// both seed; the seed is the identical default document, so the race is
    /// harmless last-writer-wins.
    #[must_use]
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.sync_loop().await;
        })
    }

    async fn sync_loop(&self) {
        let mut rx = self.remote.watch();
        loop {
            let remote_doc = rx.borrow_and_update().clone();
            self.reconcile(remote_doc).await;
            if rx.changed().await.is_err() {
                tracing::warn!("remote subscription closed; sync loop stopping");
                return;
            }
        }
    }

    /// Process one remote callback.
    async fn reconcile(&self, remote_doc: Option<JsonObject>) {
        match remote_doc {
            Some(doc) => self.adopt_remote(doc),
            None => self.seed_remote().await,
        }
    }

    /// Merge a remote document over the default and make it canonical.
    fn adopt_remote(&self, doc: JsonObject) {
        let mut merged = to_object(&SiteConfiguration::default());
        for (key, value) in doc {
            merged.insert(key, value);
        }

        match serde_json::from_value::<SiteConfiguration>(Value::Object(merged)) {
            Ok(next) => {
                let mut canonical = self.lock();
                canonical.config = Arc::new(next);
                canonical.loading = false;
                self.tx.send_replace(ConfigSnapshot {
                    loading: false,
                    config: Arc::clone(&canonical.config),
                });
                tracing::debug!("adopted remote site-config document");
            }
            Err(error) => {
                tracing::error!(%error, "remote document does not fit the schema; keeping current state");
            }
        }
    }

    /// No remote document exists: push the current in-memory state upstream
    /// as the new baseline. Goes through the same persistence queue as
    /// local updates, so a seed never reorders around a concurrent edit.
    async fn seed_remote(&self) {
        let seed = self.current_object();
        match self.persist(seed).await {
            Ok(()) => {
                let mut canonical = self.lock();
                if canonical.loading {
                    canonical.loading = false;
                    self.tx.send_replace(ConfigSnapshot {
                        loading: false,
                        config: Arc::clone(&canonical.config),
                    });
                }
                tracing::info!("seeded remote store with the default site-config document");
            }
            Err(error) => {
                tracing::error!(%error, "failed to seed remote store; local state remains usable");
            }
        }
    }

    /// Enqueue an upsert and wait for its acknowledgment.
    async fn persist(&self, partial: JsonObject) -> Result<(), RemoteError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.persist_tx.send((partial, ack_tx)).is_err() {
            return Err(RemoteError::Backend(PERSIST_STOPPED.to_string()));
        }
        ack_rx
            .await
            .unwrap_or_else(|_| Err(RemoteError::Backend(PERSIST_STOPPED.to_string())))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Canonical> {
        self.canonical.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Start the task that forwards queued upserts to the remote one at a time,
/// in the order they were enqueued. It stops when the store is dropped.
fn spawn_persist_task(remote: Arc<dyn RemoteStore>) -> mpsc::UnboundedSender<PersistJob> {
    let (tx, mut rx) = mpsc::unbounded_channel::<PersistJob>();
    tokio::spawn(async move {
        while let Some((partial, ack)) = rx.recv().await {
            let result = remote.upsert(partial).await;
            if let Err(error) = &result {
                tracing::error!(%error, "queued upsert of local update failed");
            }
            // The committer may have detached; the result is then dropped.
            let _ = ack.send(result);
        }
    });
    tx
}

/// Serialize a document to its JSON-object wire shape.
///
/// Serialization of `SiteConfiguration` cannot fail and always yields an
/// object; the fallback arm is unreachable.
pub(crate) fn to_object(config: &SiteConfiguration) -> JsonObject {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::remote::InMemoryRemote;

    use super::*;

    fn obj(value: Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_update_replaces_top_level_keys_verbatim() {
        let store = ConfigStore::new(Arc::new(InMemoryRemote::new()));

        // A partial that replaces `faqPage` wholesale.
        let partial = obj(json!({
            "siteName": "Velluto Milano",
            "faqPage": [{"q": "Only question?", "a": "Only answer."}]
        }));
        store.update(partial).unwrap().confirmed().await.unwrap();

        let doc = store.current();
        assert_eq!(doc.site_name, "Velluto Milano");
        assert_eq!(doc.faq_page.len(), 1);
        // Keys absent from the partial are unchanged.
        assert_eq!(doc.contact, SiteConfiguration::default().contact);
    }

    #[tokio::test]
    async fn test_update_is_not_a_deep_merge() {
        let store = ConfigStore::new(Arc::new(InMemoryRemote::new()));

        // `home` provided with only one field: the whole top-level key is
        // replaced, so every other home field falls back to its default
        // rather than keeping a previous edit.
        store
            .update(obj(json!({"home": {"heroTitle": "First edit"}})))
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        store
            .update(obj(json!({"home": {"heroCta": "Second edit"}})))
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        let doc = store.current();
        assert_eq!(doc.home.hero_cta, "Second edit");
        // The first edit was clobbered because the caller omitted it.
        assert_eq!(
            doc.home.hero_title,
            SiteConfiguration::default().home.hero_title
        );
    }

    #[tokio::test]
    async fn test_invalid_partial_rejected_atomically() {
        let store = ConfigStore::new(Arc::new(InMemoryRemote::new()));
        let before = store.current();

        let result = store.update(obj(json!({"testimonials": "not a list"})));
        assert!(matches!(result, Err(UpdateError::Schema(_))));
        assert_eq!(*store.current(), *before);
    }

    #[tokio::test]
    async fn test_update_visible_before_remote_ack() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.set_offline(true);
        let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        let commit = store.update(obj(json!({"siteName": "Optimistic"}))).unwrap();

        // Local state reflects the edit immediately, even though the remote
        // is down; the failure surfaces only through the commit handle.
        assert_eq!(store.current().site_name, "Optimistic");
        assert!(commit.confirmed().await.is_err());
        assert_eq!(store.current().site_name, "Optimistic");
    }

    #[tokio::test]
    async fn test_rapid_updates_persist_in_call_order() {
        let remote = Arc::new(InMemoryRemote::new());
        let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        // Two back-to-back updates to the same key, neither awaited before
        // the other is issued: the remote must end up with the later value.
        let first = store.update(obj(json!({"siteName": "First"}))).unwrap();
        let second = store.update(obj(json!({"siteName": "Second"}))).unwrap();
        first.confirmed().await.unwrap();
        second.confirmed().await.unwrap();

        let doc = remote.document().unwrap();
        assert_eq!(doc.get("siteName"), Some(&json!("Second")));
        assert_eq!(store.current().site_name, "Second");
    }

    #[tokio::test]
    async fn test_subscribers_notified_synchronously_on_update() {
        let store = ConfigStore::new(Arc::new(InMemoryRemote::new()));
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store
            .update(obj(json!({"siteName": "Notified"})))
            .unwrap()
            .detach();

        // The notification was sent before `update` returned.
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().config.site_name, "Notified");
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_empty_remote_and_clears_loading() {
        let remote = Arc::new(InMemoryRemote::new());
        let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        assert!(store.is_loading());

        let _sync = store.spawn_sync();
        let mut rx = store.subscribe();
        rx.wait_for(|s| !s.loading).await.unwrap();

        let seeded = remote.document().unwrap();
        assert_eq!(
            Value::Object(seeded),
            serde_json::to_value(SiteConfiguration::default()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_bootstrap_adopts_existing_remote_document() {
        let mut doc = to_object(&SiteConfiguration::default());
        doc.insert("siteName".to_string(), json!("Remote Wins"));
        // Simulate a field the remote never persisted.
        doc.remove("privacyPolicy");

        let remote = Arc::new(InMemoryRemote::with_document(doc));
        let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        let _sync = store.spawn_sync();

        let mut rx = store.subscribe();
        let snapshot = rx.wait_for(|s| !s.loading).await.unwrap().clone();

        assert_eq!(snapshot.config.site_name, "Remote Wins");
        // Never-persisted fields keep their defaults.
        assert_eq!(
            snapshot.config.privacy_policy,
            SiteConfiguration::default().privacy_policy
        );
    }

    #[tokio::test]
    async fn test_remote_push_reaches_subscribers() {
        let remote = Arc::new(InMemoryRemote::with_document(to_object(
            &SiteConfiguration::default(),
        )));
        let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
        let _sync = store.spawn_sync();

        let mut rx = store.subscribe();
        rx.wait_for(|s| !s.loading).await.unwrap();

        let mut doc = to_object(&SiteConfiguration::default());
        doc.insert("siteName".to_string(), json!("Pushed From Elsewhere"));
        remote.push_remote_change(doc);

        let snapshot = rx
            .wait_for(|s| s.config.site_name == "Pushed From Elsewhere")
            .await
            .unwrap()
            .clone();
        assert!(!snapshot.loading);
    }
}
