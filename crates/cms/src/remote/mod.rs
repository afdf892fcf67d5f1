//! The persistence boundary for the configuration document.
//!
//! The core treats the remote store as a black box offering two primitives:
//! a watch subscription that always holds the last known remote state, and a
//! best-effort shallow-merge upsert. The core never awaits an upsert before
//! treating a local update as applied and never retries a failed one.

use thiserror::Error;
use tokio::sync::watch;

use crate::BoxFuture;

mod memory;
mod postgres;

pub use memory::InMemoryRemote;
pub use postgres::PgRemote;

/// A JSON object: the wire shape of the configuration document and of every
/// structurally-partial update.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Errors from the remote persistence backend.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The backend cannot be reached. Local state remains usable.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("remote store error: {0}")]
    Backend(String),
}

/// Contract with the remote persistence backend.
///
/// Implementations must be cheap to subscribe to: the returned receiver
/// holds the last known remote document (`None` if no document exists yet)
/// immediately, and observes every subsequent remote change for the lifetime
/// of the subscription. Dropping the receiver is the unsubscribe.
pub trait RemoteStore: Send + Sync {
    /// Watch the remote document.
    fn watch(&self) -> watch::Receiver<Option<JsonObject>>;

    /// Persist a structurally-partial document.
    ///
    /// Each top-level key in `partial` replaces the corresponding key of the
    /// stored document; keys absent from `partial` are untouched. Idempotent
    /// per call.
    fn upsert(&self, partial: JsonObject) -> BoxFuture<'_, Result<(), RemoteError>>;
}
