//! Unified error handling for the admin surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use velluto_cms::{InvalidPathError, RemoteError, UpdateError, UploadError};

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A partial did not fit the document schema.
    #[error("Update rejected: {0}")]
    Update(#[from] UpdateError),

    /// A nested path did not resolve against the document.
    #[error("Invalid path: {0}")]
    Path(#[from] InvalidPathError),

    /// The remote store could not persist an update.
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// The upload pipeline failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Remote(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Upload(UploadError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Update(_) | Self::Path(_) | Self::Upload(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Remote(_) => "Remote store error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_maps_to_bad_request() {
        let err = AppError::Path(InvalidPathError {
            path: "x.y".to_string(),
            reason: "missing key".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_remote_maps_to_bad_gateway() {
        let err = AppError::Remote(RemoteError::Unavailable("down".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
