//! The CMS editor's working copy.
//!
//! The editing surface never mutates the canonical document directly: it
//! clones it, applies nested-path edits to the clone, and commits the whole
//! document back through [`ConfigStore::update`]. A remote update from
//! another session only reaches the working copy when the editor explicitly
//! re-syncs, and a failed commit leaves the edits in place so the operator
//! can retry without losing work.

use serde_json::Value;

use crate::paths::{InvalidPathError, set_at_path, value_at_path};
use crate::remote::JsonObject;
use crate::store::{Commit, ConfigStore, UpdateError};

/// A private, edited-but-uncommitted clone of the configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    doc: Value,
}

impl WorkingCopy {
    /// Clone the store's current canonical document.
    #[must_use]
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            doc: Value::Object(store.current_object()),
        }
    }

    /// The working document (camelCase wire shape).
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.doc
    }

    /// Read a nested field.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        value_at_path(&self.doc, path)
    }

    /// Write a nested field.
    ///
    /// # Errors
    ///
    /// [`InvalidPathError`] if the path does not resolve; the working copy
    /// is unchanged in that case.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), InvalidPathError> {
        self.doc = set_at_path(&self.doc, path, value)?;
        Ok(())
    }

    /// Discard local edits and re-sync with the canonical document. This is
    /// the only moment another session's update can overwrite unsaved work.
    pub fn resync(&mut self, store: &ConfigStore) {
        self.doc = Value::Object(store.current_object());
    }

    /// Commit the working copy: every top-level key is replaced in the
    /// canonical document. The working copy is kept as-is, so a failed
    /// remote persist can simply be retried.
    ///
    /// # Errors
    ///
    /// [`UpdateError`] if the working copy no longer fits the document
    /// schema (possible only through edits to `extra`-style dynamic keys
    /// shadowing typed ones).
    pub fn commit(&self, store: &ConfigStore) -> Result<Commit, UpdateError> {
        let partial: JsonObject = match &self.doc {
            Value::Object(map) => map.clone(),
            // The working copy is constructed from a document and only ever
            // replaced by set_at_path output, so it stays an object.
            _ => JsonObject::new(),
        };
        store.update(partial)
    }
}
