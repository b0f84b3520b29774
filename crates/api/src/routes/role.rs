//! Route definitions for the `/roles` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::role;
use crate::state::AppState;

/// Routes mounted at `/roles`.
///
/// ```text
/// GET    /{id}              -> get_by_id
/// DELETE /{id}              -> delete
/// POST   /{id}/archive      -> archive
/// POST   /{id}/restore      -> restore
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(role::get_by_id).delete(role::delete))
        .route("/{id}/archive", post(role::archive))
        .route("/{id}/restore", post(role::restore))
}
