//! Integration tests for configuration store synchronization.
//!
//! These run fully in-process against the in-memory remote store; no
//! external services are required.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::{Value, json};

use velluto_cms::{ConfigStore, InMemoryRemote, JsonObject, RemoteStore};
use velluto_core::SiteConfiguration;

fn obj(value: Value) -> JsonObject {
    value.as_object().unwrap().clone()
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_two_clients_bootstrapping_empty_remote_converge_on_default() {
    let remote = Arc::new(InMemoryRemote::new());

    // First client boots against the empty remote and seeds it.
    let first = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_a = first.spawn_sync();
    first
        .subscribe()
        .wait_for(|s| !s.loading)
        .await
        .unwrap();

    // Second client boots afterwards and adopts what the first seeded.
    let second = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_b = second.spawn_sync();
    second
        .subscribe()
        .wait_for(|s| !s.loading)
        .await
        .unwrap();

    // Both end on exactly the default document, and so does the remote:
    // the seed is deterministic, so even a seed/seed race is harmless.
    let default_doc = serde_json::to_value(SiteConfiguration::default()).unwrap();
    assert_eq!(serde_json::to_value(&*first.current()).unwrap(), default_doc);
    assert_eq!(serde_json::to_value(&*second.current()).unwrap(), default_doc);
    assert_eq!(Value::Object(remote.document().unwrap()), default_doc);
}

#[tokio::test]
async fn test_second_client_sees_first_clients_edits() {
    let remote = Arc::new(InMemoryRemote::new());

    let first = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_a = first.spawn_sync();
    first.subscribe().wait_for(|s| !s.loading).await.unwrap();

    first
        .update(obj(json!({"siteName": "Velluto Roma"})))
        .unwrap()
        .confirmed()
        .await
        .unwrap();

    // A client booting later adopts the edited document, not the default.
    let second = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_b = second.spawn_sync();
    let snapshot = second
        .subscribe()
        .wait_for(|s| !s.loading)
        .await
        .unwrap()
        .clone();

    assert_eq!(snapshot.config.site_name, "Velluto Roma");
}

// ============================================================================
// Live propagation
// ============================================================================

#[tokio::test]
async fn test_edit_on_one_store_propagates_to_another() {
    let remote = Arc::new(InMemoryRemote::new());

    let writer = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let reader = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_w = writer.spawn_sync();
    let _sync_r = reader.spawn_sync();

    let mut reader_rx = reader.subscribe();
    reader_rx.wait_for(|s| !s.loading).await.unwrap();

    writer
        .update(obj(json!({"activeCurrency": "EUR"})))
        .unwrap()
        .confirmed()
        .await
        .unwrap();

    let snapshot = reader_rx
        .wait_for(|s| s.config.active_currency == "EUR")
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.config.active_currency, "EUR");
}

#[tokio::test]
async fn test_unknown_top_level_keys_survive_the_round_trip() {
    let remote = Arc::new(InMemoryRemote::new());

    let writer = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_w = writer.spawn_sync();
    writer.subscribe().wait_for(|s| !s.loading).await.unwrap();

    // A key this build of the schema does not model.
    writer
        .update(obj(json!({"experimentalBanner": {"enabled": true}})))
        .unwrap()
        .confirmed()
        .await
        .unwrap();

    let reader = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync_r = reader.spawn_sync();
    reader.subscribe().wait_for(|s| !s.loading).await.unwrap();

    let doc = reader.current_object();
    assert_eq!(doc["experimentalBanner"], json!({"enabled": true}));
}

// ============================================================================
// Degraded remote
// ============================================================================

#[tokio::test]
async fn test_offline_remote_keeps_local_edits_usable() {
    let remote = Arc::new(InMemoryRemote::new());
    let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);
    let _sync = store.spawn_sync();
    store.subscribe().wait_for(|s| !s.loading).await.unwrap();

    remote.set_offline(true);

    let commit = store
        .update(obj(json!({"siteName": "Edited While Down"})))
        .unwrap();
    assert_eq!(store.current().site_name, "Edited While Down");
    assert!(commit.confirmed().await.is_err());

    // The remote never received the edit, the local document kept it.
    let stored = remote.document().unwrap();
    assert_ne!(stored["siteName"], json!("Edited While Down"));
    assert_eq!(store.current().site_name, "Edited While Down");
}
