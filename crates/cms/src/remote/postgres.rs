//! Postgres-backed remote store.
//!
//! The document lives in a single JSONB row. Upserts merge at the top level
//! with the `||` operator and announce themselves over `pg_notify`; a
//! background listener refetches on every notification and feeds the watch
//! channel, so other processes' writes arrive the same way our own do.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::watch;

use super::{JsonObject, RemoteError, RemoteStore};
use crate::BoxFuture;

/// Notification channel for document changes.
const NOTIFY_CHANNEL: &str = "velluto_site_config";

/// Delay before reattaching a dropped listener connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Remote store over a Postgres JSONB row.
pub struct PgRemote {
    pool: PgPool,
    tx: watch::Sender<Option<JsonObject>>,
}

impl PgRemote {
    /// Connect, fetch the last known remote state and start the listener.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the initial fetch fails.
    pub async fn connect(pool: PgPool) -> Result<Arc<Self>, RemoteError> {
        let initial = fetch_document(&pool).await.map_err(map_sqlx_error)?;
        let (tx, _rx) = watch::channel(initial);

        let remote = Arc::new(Self { pool, tx });
        let listener = Arc::clone(&remote);
        tokio::spawn(async move {
            listener.listen_loop().await;
        });

        Ok(remote)
    }

    /// Listen for change notifications for the life of the process,
    /// reconnecting after transient failures.
    async fn listen_loop(&self) {
        loop {
            match PgListener::connect_with(&self.pool).await {
                Ok(mut listener) => {
                    if let Err(error) = listener.listen(NOTIFY_CHANNEL).await {
                        tracing::error!(%error, "failed to LISTEN on site-config channel");
                    } else {
                        tracing::info!(channel = NOTIFY_CHANNEL, "site-config listener attached");
                        self.pump(&mut listener).await;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "failed to connect site-config listener");
                }
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    /// Forward notifications into the watch channel until the connection drops.
    async fn pump(&self, listener: &mut PgListener) {
        loop {
            match listener.recv().await {
                Ok(_notification) => match fetch_document(&self.pool).await {
                    Ok(doc) => {
                        self.tx.send_replace(doc);
                    }
                    Err(error) => {
                        tracing::error!(%error, "failed to refetch site-config after notify");
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "site-config listener dropped; reconnecting");
                    return;
                }
            }
        }
    }
}

impl RemoteStore for PgRemote {
    fn watch(&self) -> watch::Receiver<Option<JsonObject>> {
        self.tx.subscribe()
    }

    fn upsert(&self, partial: JsonObject) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO site_config (id, doc) VALUES (1, $1) \
                 ON CONFLICT (id) DO UPDATE \
                 SET doc = site_config.doc || EXCLUDED.doc, updated_at = now()",
            )
            .bind(Value::Object(partial))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            sqlx::query("SELECT pg_notify($1, '')")
                .bind(NOTIFY_CHANNEL)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            // Echo our own write into the watch immediately; the notify path
            // also delivers it, but this one does not depend on the listener
            // connection being up.
            match fetch_document(&self.pool).await {
                Ok(doc) => {
                    self.tx.send_replace(doc);
                }
                Err(error) => {
                    tracing::error!(%error, "failed to refetch site-config after upsert");
                }
            }

            Ok(())
        })
    }
}

/// Fetch the stored document, if any.
async fn fetch_document(pool: &PgPool) -> Result<Option<JsonObject>, sqlx::Error> {
    let row: Option<(Value,)> = sqlx::query_as("SELECT doc FROM site_config WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(value,)| match value {
        Value::Object(map) => Some(map),
        _ => None,
    }))
}

fn map_sqlx_error(error: sqlx::Error) -> RemoteError {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            RemoteError::Unavailable(error.to_string())
        }
        _ => RemoteError::Backend(error.to_string()),
    }
}
