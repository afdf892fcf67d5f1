//! Gated bulk maintenance endpoints.
//!
//! Each purge kind owns at most one armed gate at a time, held in shared
//! state. The endpoints drive the gate's confirmation protocol; the
//! destructive work itself runs inside the gate's bound action.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use velluto_cms::{DestructiveActionGate, GateOutcome, GateState, PurgeKind, gate_for};

use crate::error::AppError;
use crate::state::AppState;

/// Build the maintenance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance/{kind}/arm", post(arm))
        .route("/api/maintenance/{kind}/acknowledge", post(acknowledge))
        .route("/api/maintenance/{kind}/cancel", post(cancel))
        .route("/api/maintenance/{kind}/confirm", post(confirm))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ConfirmBody {
    phrase: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GateView {
    kind: &'static str,
    state: &'static str,
    title: String,
    warning_text: String,
    required_phrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

const fn state_slug(state: GateState) -> &'static str {
    match state {
        GateState::Idle => "idle",
        GateState::AwaitingFirstConfirm => "awaiting-first-confirm",
        GateState::AwaitingTypedConfirm => "awaiting-typed-confirm",
        GateState::Executing => "executing",
        GateState::Succeeded => "succeeded",
        GateState::Failed => "failed",
    }
}

fn gate_view(kind: PurgeKind, gate: &DestructiveActionGate, failure: Option<String>) -> GateView {
    let prompt = gate.prompt();
    GateView {
        kind: kind.slug(),
        state: state_slug(gate.state()),
        title: prompt.title.clone(),
        warning_text: prompt.warning_text.clone(),
        required_phrase: prompt.required_phrase.clone(),
        validation_message: gate.validation_message().map(str::to_string),
        failure,
    }
}

fn parse_kind(slug: &str) -> Result<PurgeKind, AppError> {
    slug.parse()
        .map_err(|err: velluto_cms::UnknownPurgeKind| AppError::BadRequest(err.to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Arm a fresh gate for the given purge kind, replacing any previous one.
#[instrument(skip(state))]
async fn arm(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<GateView>, AppError> {
    let kind = parse_kind(&kind)?;
    let gate = gate_for(kind, state.maintenance.clone());
    let view = gate_view(kind, &gate, None);
    state.gates.lock().await.insert(kind, gate);
    Ok(Json(view))
}

/// First-stage acknowledgment of the warning.
#[instrument(skip(state))]
async fn acknowledge(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<GateView>, AppError> {
    let kind = parse_kind(&kind)?;
    let mut gates = state.gates.lock().await;
    let Some(gate) = gates.get_mut(&kind) else {
        return Err(AppError::BadRequest(format!("no armed gate for {}", kind.slug())));
    };
    gate.acknowledge();
    Ok(Json(gate_view(kind, gate, None)))
}

/// Abort the confirmation flow; the destructive action is never invoked.
#[instrument(skip(state))]
async fn cancel(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<GateView>, AppError> {
    let kind = parse_kind(&kind)?;
    let mut gates = state.gates.lock().await;
    let Some(gate) = gates.get_mut(&kind) else {
        return Err(AppError::BadRequest(format!("no armed gate for {}", kind.slug())));
    };
    gate.decline();
    Ok(Json(gate_view(kind, gate, None)))
}

/// Submit the typed confirmation phrase and, on an exact match, execute.
#[instrument(skip(state, body))]
async fn confirm(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<GateView>, AppError> {
    let kind = parse_kind(&kind)?;
    let mut gates = state.gates.lock().await;
    let Some(gate) = gates.get_mut(&kind) else {
        return Err(AppError::BadRequest(format!("no armed gate for {}", kind.slug())));
    };

    let failure = match gate.confirm(&body.phrase).await {
        GateOutcome::ActionFailed(failure) => {
            tracing::error!(kind = kind.slug(), error = %failure, "Bulk maintenance failed");
            Some(failure.to_string())
        }
        GateOutcome::Completed => {
            tracing::warn!(kind = kind.slug(), "Bulk maintenance executed");
            None
        }
        GateOutcome::Mismatch | GateOutcome::NotAwaitingConfirmation => None,
    };

    Ok(Json(gate_view(kind, gate, failure)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_slugs_are_kebab_case() {
        assert_eq!(state_slug(GateState::AwaitingTypedConfirm), "awaiting-typed-confirm");
        assert_eq!(state_slug(GateState::Idle), "idle");
    }

    #[test]
    fn test_parse_kind_rejects_unknown_slug() {
        assert!(parse_kind("everything").is_err());
        assert!(parse_kind("rentals").is_ok());
    }
}
