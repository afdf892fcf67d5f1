//! Live site configuration endpoints.
//!
//! Reads return the store's current snapshot; writes go through the
//! store's validate-then-merge pipeline. Writes are optimistic by default
//! and only await the remote round trip when `?confirm=true` is given.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use velluto_cms::{JsonObject, set_at_path};

use crate::error::AppError;
use crate::state::AppState;

/// Build the site configuration router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/site-config", get(get_site_config).put(put_site_config))
        .route("/api/site-config/field", post(set_field))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
struct WriteParams {
    /// Await remote persistence before responding.
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    /// Dot-delimited path into the document, e.g. `customSections.heritage.title`.
    path: String,
    value: Value,
}

// =============================================================================
// Handlers
// =============================================================================

/// Current document plus whether the initial remote sync has completed.
async fn get_site_config(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "loading": state.store.is_loading(),
        "config": Value::Object(state.store.current_object()),
    }))
}

/// Shallow top-level merge of a partial document.
#[instrument(skip(state, partial))]
async fn put_site_config(
    State(state): State<AppState>,
    Query(params): Query<WriteParams>,
    Json(partial): Json<JsonObject>,
) -> Result<Json<Value>, AppError> {
    let commit = state.store.update(partial)?;
    if params.confirm {
        commit.confirmed().await?;
    } else {
        commit.detach();
    }
    Ok(Json(Value::Object(state.store.current_object())))
}

/// Set one nested field, committing only its top-level key.
#[instrument(skip(state, update), fields(path = %update.path))]
async fn set_field(
    State(state): State<AppState>,
    Query(params): Query<WriteParams>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<Value>, AppError> {
    let FieldUpdate { path, value } = update;
    let doc = Value::Object(state.store.current_object());
    let edited = set_at_path(&doc, &path, value)?;

    let Some(top_key) = path.split('.').next().filter(|k| !k.is_empty()) else {
        return Err(AppError::BadRequest("empty field path".to_string()));
    };
    let Value::Object(edited) = edited else {
        return Err(AppError::Internal("document root is not an object".to_string()));
    };
    let Some(subtree) = edited.get(top_key) else {
        return Err(AppError::BadRequest(format!("unknown field {top_key:?}")));
    };

    let mut partial = JsonObject::new();
    partial.insert(top_key.to_string(), subtree.clone());

    let commit = state.store.update(partial)?;
    if params.confirm {
        commit.confirmed().await?;
    } else {
        commit.detach();
    }
    Ok(Json(Value::Object(state.store.current_object())))
}
