//! Velluto CMS - Live site-configuration synchronization engine.
//!
//! This crate holds the single structured configuration document that drives
//! the storefront, keeps every subscriber eventually consistent with the
//! remote source of truth, and provides the editing primitives the CMS
//! surface is built on.
//!
//! # Architecture
//!
//! - [`store::ConfigStore`] - canonical in-memory document, merge-based
//!   updates, change notification via a `watch` channel
//! - [`remote`] - the persistence boundary: subscribe-with-watch and upsert,
//!   with in-memory and Postgres implementations
//! - [`paths`] - dot-delimited nested-path edits over the document
//! - [`editor::WorkingCopy`] - the editor's private, uncommitted clone
//! - [`gate::DestructiveActionGate`] - two-phase typed confirmation for
//!   irreversible bulk operations
//! - [`maintenance`] - the bulk-wipe operations themselves
//! - [`uploads`] - image upload and attach-at-path
//!
//! # Data flow
//!
//! The remote store pushes the authoritative document into the
//! `ConfigStore`, which notifies all readers. The editor holds a working
//! copy, edits it via path edits, and commits through `ConfigStore::update`,
//! which merges locally first and persists upstream in the background.
//! Bulk destructive operations bypass the document entirely and act on other
//! collections, always through the gate.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::future::Future;
use std::pin::Pin;

pub mod db;
pub mod editor;
pub mod gate;
pub mod maintenance;
pub mod paths;
pub mod remote;
pub mod store;
pub mod uploads;

/// Owned, sendable boxed future, used to keep the external-facing traits
/// object-safe without an async-trait dependency.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use editor::WorkingCopy;
pub use gate::{
    DestructiveActionFailure, DestructiveActionGate, GateAction, GateOutcome, GatePrompt,
    GateState,
};
pub use maintenance::{
    MaintenanceOps, PgMaintenance, PurgeError, PurgeKind, RecordingMaintenance, UnknownPurgeKind,
    gate_for,
};
pub use paths::{InvalidPathError, set_at_path, value_at_path};
pub use remote::{InMemoryRemote, JsonObject, PgRemote, RemoteError, RemoteStore};
pub use store::{Commit, ConfigSnapshot, ConfigStore, UpdateError};
pub use uploads::{FsImageStorage, ImageStorage, UploadError, attach_image};
