//! Shared application state for the admin server.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;

use velluto_cms::{
    ConfigStore, DestructiveActionGate, ImageStorage, MaintenanceOps, PurgeKind,
};

use crate::config::AdminConfig;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    /// Server configuration loaded from the environment.
    pub config: AdminConfig,
    /// Postgres connection pool.
    pub pool: PgPool,
    /// Live site configuration store.
    pub store: Arc<ConfigStore>,
    /// Binary asset storage backend.
    pub storage: Arc<dyn ImageStorage>,
    /// Destructive maintenance operations backend.
    pub maintenance: Arc<dyn MaintenanceOps>,
    /// One confirmation gate per purge kind, armed on demand.
    pub gates: Mutex<HashMap<PurgeKind, DestructiveActionGate>>,
}

impl AppState {
    pub fn new(
        config: AdminConfig,
        pool: PgPool,
        store: Arc<ConfigStore>,
        storage: Arc<dyn ImageStorage>,
        maintenance: Arc<dyn MaintenanceOps>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                storage,
                maintenance,
                gates: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
