//! Two-phase typed confirmation for irreversible operations.
//!
//! The gate is the contract; whatever renders it (an HTTP surface, a
//! terminal prompt) is a pluggable view of its current state. It carries no
//! knowledge of which collection the bound action wipes.
//!
//! State machine per invocation:
//!
//! ```text
//! Idle -> AwaitingFirstConfirm -> AwaitingTypedConfirm -> Executing -> Succeeded
//!              |                        |                      \-> Failed
//!              +------ decline ---------+---> Idle (action dropped, never run)
//! ```
//!
//! A typed phrase that is not an exact, case-sensitive match keeps the gate
//! in `AwaitingTypedConfirm` with a validation message; the action is
//! invoked exactly once, only from `Executing`, and its failure is caught
//! and reported rather than propagated.

use thiserror::Error;

use crate::BoxFuture;

/// The bound destructive action raised. Reported to the operator; the
/// configuration document is unaffected (purges act on other collections).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("destructive action failed: {0}")]
pub struct DestructiveActionFailure(pub String);

/// A zero-argument asynchronous destructive action.
pub type GateAction =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<(), DestructiveActionFailure>> + Send>;

/// What the operator is shown before confirming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePrompt {
    pub title: String,
    pub warning_text: String,
    /// The exact phrase the operator must type.
    pub required_phrase: String,
}

/// Observable state of one gate invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    AwaitingFirstConfirm,
    AwaitingTypedConfirm,
    Executing,
    Succeeded,
    Failed,
}

/// Result of a typed confirmation attempt.
#[derive(Debug)]
pub enum GateOutcome {
    /// The phrase matched and the action completed.
    Completed,
    /// The phrase did not match; still awaiting the typed confirmation.
    Mismatch,
    /// The phrase matched but the action raised.
    ActionFailed(DestructiveActionFailure),
    /// The gate was not awaiting a typed confirmation.
    NotAwaitingConfirmation,
}

/// One armed invocation of the confirmation protocol.
pub struct DestructiveActionGate {
    state: GateState,
    prompt: GatePrompt,
    action: Option<GateAction>,
    validation_message: Option<String>,
}

impl DestructiveActionGate {
    /// Arm the gate with a prompt and the action it guards.
    #[must_use]
    pub fn arm(prompt: GatePrompt, action: GateAction) -> Self {
        Self {
            state: GateState::AwaitingFirstConfirm,
            prompt,
            action: Some(action),
            validation_message: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub const fn prompt(&self) -> &GatePrompt {
        &self.prompt
    }

    /// The message to show after a mismatched phrase, if any.
    #[must_use]
    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    /// Affirmative acknowledgment of the first warning.
    ///
    /// Returns false (and leaves the gate untouched) unless the gate was in
    /// `AwaitingFirstConfirm`.
    pub fn acknowledge(&mut self) -> bool {
        if self.state == GateState::AwaitingFirstConfirm {
            self.state = GateState::AwaitingTypedConfirm;
            true
        } else {
            false
        }
    }

    /// Anything other than an explicit affirmative: back to `Idle`, the
    /// action is dropped and will never be invoked.
    pub fn decline(&mut self) {
        if matches!(
            self.state,
            GateState::AwaitingFirstConfirm | GateState::AwaitingTypedConfirm
        ) {
            self.state = GateState::Idle;
            self.action = None;
            self.validation_message = None;
        }
    }

    /// Submit the typed confirmation phrase.
    ///
    /// An exact, case-sensitive match moves to `Executing` and runs the
    /// bound action exactly once; any other input stays in
    /// `AwaitingTypedConfirm` with a validation message.
    pub async fn confirm(&mut self, typed: &str) -> GateOutcome {
        if self.state != GateState::AwaitingTypedConfirm {
            return GateOutcome::NotAwaitingConfirmation;
        }

        if typed != self.prompt.required_phrase {
            self.validation_message = Some(format!(
                "Type {} exactly to proceed",
                self.prompt.required_phrase
            ));
            return GateOutcome::Mismatch;
        }

        // The action is present whenever we are in a confirm state; it is
        // only taken here and only dropped by decline().
        let Some(action) = self.action.take() else {
            self.state = GateState::Failed;
            return GateOutcome::ActionFailed(DestructiveActionFailure(
                "action already consumed".to_string(),
            ));
        };

        self.validation_message = None;
        self.state = GateState::Executing;
        match action().await {
            Ok(()) => {
                self.state = GateState::Succeeded;
                GateOutcome::Completed
            }
            Err(failure) => {
                self.state = GateState::Failed;
                GateOutcome::ActionFailed(failure)
            }
        }
    }
}

impl std::fmt::Debug for DestructiveActionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestructiveActionGate")
            .field("state", &self.state)
            .field("prompt", &self.prompt)
            .field("validation_message", &self.validation_message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn prompt() -> GatePrompt {
        GatePrompt {
            title: "Wipe all rentals".to_string(),
            warning_text: "This deletes every rental record.".to_string(),
            required_phrase: "CONFIRM RENTAL WIPE".to_string(),
        }
    }

    fn counting_action(calls: &Arc<AtomicUsize>) -> GateAction {
        let calls = Arc::clone(calls);
        Box::new(move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_happy_path_runs_action_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gate = DestructiveActionGate::arm(prompt(), counting_action(&calls));
        assert_eq!(gate.state(), GateState::AwaitingFirstConfirm);

        assert!(gate.acknowledge());
        assert_eq!(gate.state(), GateState::AwaitingTypedConfirm);

        let outcome = gate.confirm("CONFIRM RENTAL WIPE").await;
        assert!(matches!(outcome, GateOutcome::Completed));
        assert_eq!(gate.state(), GateState::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrong_case_phrase_does_not_invoke_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gate = DestructiveActionGate::arm(prompt(), counting_action(&calls));
        gate.acknowledge();

        let outcome = gate.confirm("confirm rental wipe").await;
        assert!(matches!(outcome, GateOutcome::Mismatch));
        assert_eq!(gate.state(), GateState::AwaitingTypedConfirm);
        assert!(gate.validation_message().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // The operator can retry with the exact phrase.
        let outcome = gate.confirm("CONFIRM RENTAL WIPE").await;
        assert!(matches!(outcome, GateOutcome::Completed));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decline_at_first_warning_never_invokes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gate = DestructiveActionGate::arm(prompt(), counting_action(&calls));

        gate.decline();
        assert_eq!(gate.state(), GateState::Idle);

        // The gate no longer accepts a phrase.
        let outcome = gate.confirm("CONFIRM RENTAL WIPE").await;
        assert!(matches!(outcome, GateOutcome::NotAwaitingConfirmation));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_from_typed_confirm_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gate = DestructiveActionGate::arm(prompt(), counting_action(&calls));
        gate.acknowledge();
        gate.decline();

        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.validation_message().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_phrase_before_acknowledgment_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gate = DestructiveActionGate::arm(prompt(), counting_action(&calls));

        let outcome = gate.confirm("CONFIRM RENTAL WIPE").await;
        assert!(matches!(outcome, GateOutcome::NotAwaitingConfirmation));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_action_reports_failed_without_panicking() {
        let mut gate = DestructiveActionGate::arm(
            prompt(),
            Box::new(|| {
                Box::pin(async {
                    Err(DestructiveActionFailure("backend exploded".to_string()))
                })
            }),
        );
        gate.acknowledge();

        let outcome = gate.confirm("CONFIRM RENTAL WIPE").await;
        match outcome {
            GateOutcome::ActionFailed(failure) => {
                assert!(failure.0.contains("backend exploded"));
            }
            other => panic!("expected ActionFailed, got {other:?}"),
        }
        assert_eq!(gate.state(), GateState::Failed);
    }
}
