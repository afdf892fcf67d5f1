//! Admin API route modules.

use axum::Router;

use crate::state::AppState;

pub mod maintenance;
pub mod site_config;
pub mod uploads;

/// Build the combined admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(site_config::router())
        .merge(maintenance::router())
        .merge(uploads::router())
}
