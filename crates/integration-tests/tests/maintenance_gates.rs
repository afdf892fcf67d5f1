//! Integration tests for the gated bulk maintenance flow.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use velluto_cms::{
    GateOutcome, GateState, PurgeKind, RecordingMaintenance, gate_for,
};

// ============================================================================
// Full protocol
// ============================================================================

#[tokio::test]
async fn test_every_purge_kind_runs_through_the_full_protocol() {
    let ops = Arc::new(RecordingMaintenance::new());

    for kind in PurgeKind::ALL {
        let mut gate = gate_for(kind, Arc::clone(&ops) as _);
        assert_eq!(gate.state(), GateState::AwaitingFirstConfirm);

        assert!(gate.acknowledge());
        let outcome = gate.confirm(kind.required_phrase()).await;
        assert!(matches!(outcome, GateOutcome::Completed), "{}", kind.slug());
        assert_eq!(gate.state(), GateState::Succeeded);
        assert_eq!(ops.count(kind), 1, "{}", kind.slug());
    }
}

#[tokio::test]
async fn test_phrases_are_not_interchangeable_between_kinds() {
    let ops = Arc::new(RecordingMaintenance::new());
    let mut gate = gate_for(PurgeKind::Rentals, Arc::clone(&ops) as _);
    gate.acknowledge();

    // The inventory phrase must not trigger the rentals purge.
    let outcome = gate.confirm(PurgeKind::Inventory.required_phrase()).await;
    assert!(matches!(outcome, GateOutcome::Mismatch));
    assert_eq!(ops.count(PurgeKind::Rentals), 0);
    assert_eq!(ops.count(PurgeKind::Inventory), 0);

    // The right phrase still works afterwards.
    let outcome = gate.confirm(PurgeKind::Rentals.required_phrase()).await;
    assert!(matches!(outcome, GateOutcome::Completed));
    assert_eq!(ops.count(PurgeKind::Rentals), 1);
}

#[tokio::test]
async fn test_cancel_mid_protocol_never_touches_data() {
    let ops = Arc::new(RecordingMaintenance::new());

    // Declined at the first warning.
    let mut gate = gate_for(PurgeKind::Identities, Arc::clone(&ops) as _);
    gate.decline();
    assert_eq!(gate.state(), GateState::Idle);

    // Declined after acknowledging, before typing.
    let mut gate = gate_for(PurgeKind::Identities, Arc::clone(&ops) as _);
    gate.acknowledge();
    gate.decline();
    assert_eq!(gate.state(), GateState::Idle);

    // A declined gate rejects a late phrase.
    let outcome = gate.confirm(PurgeKind::Identities.required_phrase()).await;
    assert!(matches!(outcome, GateOutcome::NotAwaitingConfirmation));
    assert_eq!(ops.count(PurgeKind::Identities), 0);
}

#[tokio::test]
async fn test_backend_failure_is_reported_not_panicked() {
    let ops = Arc::new(RecordingMaintenance::new());
    ops.fail_next();

    let mut gate = gate_for(PurgeKind::Payments, Arc::clone(&ops) as _);
    gate.acknowledge();

    let outcome = gate.confirm(PurgeKind::Payments.required_phrase()).await;
    assert!(matches!(outcome, GateOutcome::ActionFailed(_)));
    assert_eq!(gate.state(), GateState::Failed);

    // A fresh gate retries cleanly once the backend recovers.
    let mut gate = gate_for(PurgeKind::Payments, Arc::clone(&ops) as _);
    gate.acknowledge();
    let outcome = gate.confirm(PurgeKind::Payments.required_phrase()).await;
    assert!(matches!(outcome, GateOutcome::Completed));
}
