//! Bulk-wipe maintenance operations.
//!
//! Five irreversible operations act on collections the configuration
//! document never touches: pricing reset, rental purge, payment purge,
//! inventory purge and identity purge. They are only ever invoked through a
//! [`DestructiveActionGate`]; this module supplies each operation's prompt
//! (title, warning, required phrase) and binds a gate to the right
//! operation, keeping the gate itself free of domain knowledge.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use sqlx::PgPool;
use thiserror::Error;

use crate::BoxFuture;
use crate::gate::{DestructiveActionFailure, DestructiveActionGate, GateAction, GatePrompt};

/// A maintenance operation raised.
#[derive(Debug, Clone, Error)]
pub enum PurgeError {
    #[error("maintenance backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for PurgeError {
    fn from(error: sqlx::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

/// The bulk operations exposed to the CMS maintenance surface.
pub trait MaintenanceOps: Send + Sync {
    /// Zero out every monetary value on the inventory.
    fn reset_all_monetary_values(&self) -> BoxFuture<'_, Result<(), PurgeError>>;
    /// Delete every rental record.
    fn purge_rentals(&self) -> BoxFuture<'_, Result<(), PurgeError>>;
    /// Delete every payment record.
    fn purge_payments(&self) -> BoxFuture<'_, Result<(), PurgeError>>;
    /// Delete every inventory listing.
    fn purge_inventory(&self) -> BoxFuture<'_, Result<(), PurgeError>>;
    /// Delete every customer identity record.
    fn purge_identities(&self) -> BoxFuture<'_, Result<(), PurgeError>>;
}

/// Which bulk wipe is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeKind {
    PricingReset,
    Rentals,
    Payments,
    Inventory,
    Identities,
}

impl PurgeKind {
    pub const ALL: [Self; 5] = [
        Self::PricingReset,
        Self::Rentals,
        Self::Payments,
        Self::Inventory,
        Self::Identities,
    ];

    /// URL/CLI identifier.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::PricingReset => "pricing-reset",
            Self::Rentals => "rentals",
            Self::Payments => "payments",
            Self::Inventory => "inventory",
            Self::Identities => "identities",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PricingReset => "Reset all pricing",
            Self::Rentals => "Purge all rentals",
            Self::Payments => "Purge all payments",
            Self::Inventory => "Purge all inventory",
            Self::Identities => "Purge all identities",
        }
    }

    #[must_use]
    pub const fn warning_text(self) -> &'static str {
        match self {
            Self::PricingReset => {
                "Every listing price and rental rate will be set to zero. \
                 This cannot be undone."
            }
            Self::Rentals => {
                "Every rental record will be permanently deleted. This cannot be undone."
            }
            Self::Payments => {
                "Every payment record will be permanently deleted. This cannot be undone."
            }
            Self::Inventory => {
                "Every inventory listing will be permanently deleted. This cannot be undone."
            }
            Self::Identities => {
                "Every customer identity record will be permanently deleted. \
                 This cannot be undone."
            }
        }
    }

    /// The exact phrase the operator must type.
    #[must_use]
    pub const fn required_phrase(self) -> &'static str {
        match self {
            Self::PricingReset => "CONFIRM PRICING RESET",
            Self::Rentals => "CONFIRM RENTAL WIPE",
            Self::Payments => "CONFIRM PAYMENT WIPE",
            Self::Inventory => "CONFIRM INVENTORY WIPE",
            Self::Identities => "CONFIRM IDENTITY WIPE",
        }
    }

    #[must_use]
    pub fn prompt(self) -> GatePrompt {
        GatePrompt {
            title: self.title().to_string(),
            warning_text: self.warning_text().to_string(),
            required_phrase: self.required_phrase().to_string(),
        }
    }
}

impl FromStr for PurgeKind {
    type Err = UnknownPurgeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| UnknownPurgeKind(s.to_string()))
    }
}

/// A purge-kind slug that matches no operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown purge kind {0:?}")]
pub struct UnknownPurgeKind(pub String);

/// Arm a gate for one bulk operation.
#[must_use]
pub fn gate_for(kind: PurgeKind, ops: Arc<dyn MaintenanceOps>) -> DestructiveActionGate {
    let action: GateAction = Box::new(move || {
        Box::pin(async move {
            let result = match kind {
                PurgeKind::PricingReset => ops.reset_all_monetary_values().await,
                PurgeKind::Rentals => ops.purge_rentals().await,
                PurgeKind::Payments => ops.purge_payments().await,
                PurgeKind::Inventory => ops.purge_inventory().await,
                PurgeKind::Identities => ops.purge_identities().await,
            };
            result.map_err(|e| DestructiveActionFailure(e.to_string()))
        })
    });

    DestructiveActionGate::arm(kind.prompt(), action)
}

// =============================================================================
// Postgres implementation
// =============================================================================

/// Maintenance operations over the marketplace's Postgres collections.
pub struct PgMaintenance {
    pool: PgPool,
}

impl PgMaintenance {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn execute(&self, kind: PurgeKind, sql: &str) -> Result<(), PurgeError> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        tracing::warn!(
            operation = kind.slug(),
            rows_affected = result.rows_affected(),
            "bulk maintenance operation executed"
        );
        Ok(())
    }
}

impl MaintenanceOps for PgMaintenance {
    fn reset_all_monetary_values(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(self.execute(
            PurgeKind::PricingReset,
            "UPDATE listing SET price_usd = 0, rental_rate_usd = 0",
        ))
    }

    fn purge_rentals(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(self.execute(PurgeKind::Rentals, "DELETE FROM rental"))
    }

    fn purge_payments(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(self.execute(PurgeKind::Payments, "DELETE FROM payment"))
    }

    fn purge_inventory(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(self.execute(PurgeKind::Inventory, "DELETE FROM listing"))
    }

    fn purge_identities(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(self.execute(PurgeKind::Identities, "DELETE FROM customer"))
    }
}

// =============================================================================
// Recording fake
// =============================================================================

/// In-memory fake that counts invocations, for tests and local development.
#[derive(Debug, Default)]
pub struct RecordingMaintenance {
    counts: [AtomicUsize; 5],
    fail_next: AtomicBool,
}

impl RecordingMaintenance {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation fail with a backend error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// How many times the given operation ran.
    #[must_use]
    pub fn count(&self, kind: PurgeKind) -> usize {
        self.counts[slot(kind)].load(Ordering::SeqCst)
    }

    fn record(&self, kind: PurgeKind) -> Result<(), PurgeError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PurgeError::Backend("simulated failure".to_string()));
        }
        self.counts[slot(kind)].fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

const fn slot(kind: PurgeKind) -> usize {
    match kind {
        PurgeKind::PricingReset => 0,
        PurgeKind::Rentals => 1,
        PurgeKind::Payments => 2,
        PurgeKind::Inventory => 3,
        PurgeKind::Identities => 4,
    }
}

impl MaintenanceOps for RecordingMaintenance {
    fn reset_all_monetary_values(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(async move { self.record(PurgeKind::PricingReset) })
    }

    fn purge_rentals(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(async move { self.record(PurgeKind::Rentals) })
    }

    fn purge_payments(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(async move { self.record(PurgeKind::Payments) })
    }

    fn purge_inventory(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(async move { self.record(PurgeKind::Inventory) })
    }

    fn purge_identities(&self) -> BoxFuture<'_, Result<(), PurgeError>> {
        Box::pin(async move { self.record(PurgeKind::Identities) })
    }
}
