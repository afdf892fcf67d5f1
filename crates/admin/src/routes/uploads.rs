//! Image upload endpoint.
//!
//! Accepts a multipart form with a `path` field (where the URL lands in the
//! document) and a `file` field carrying the image bytes, then commits the
//! affected top-level key through the store.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use serde_json::{Value, json};
use tracing::instrument;

use velluto_cms::attach_image;

use crate::error::AppError;
use crate::state::AppState;

/// Build the uploads router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/uploads", post(upload_image))
}

#[instrument(skip(state, multipart))]
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut path: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("malformed multipart body: {err}")))?
    {
        match field.name() {
            Some("path") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("unreadable path field: {err}")))?;
                path = Some(text);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("unreadable file field: {err}")))?;
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let Some(path) = path else {
        return Err(AppError::BadRequest("missing path field".to_string()));
    };
    let Some((file_name, bytes)) = file else {
        return Err(AppError::BadRequest("missing file field".to_string()));
    };

    let (url, commit) = attach_image(
        state.store.as_ref(),
        state.storage.as_ref(),
        &path,
        &file_name,
        bytes,
    )
    .await?;
    commit.detach();

    tracing::info!(%url, path, "Image attached to site configuration");
    Ok(Json(json!({ "url": url, "path": path })))
}
