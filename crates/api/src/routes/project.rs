//! Route definitions for the `/projects` resource.
//!
//! Also mounts the project-scoped role routes at `/projects/{id}/roles`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{project, role};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}/status               -> update_status
/// POST   /{id}/archive              -> archive
/// POST   /{id}/restore              -> restore
///
/// GET    /{id}/roles                -> role::list_by_project
/// POST   /{id}/roles                -> role::create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id))
        .route("/{id}/status", put(project::update_status))
        .route("/{id}/archive", post(project::archive))
        .route("/{id}/restore", post(project::restore))
        .route(
            "/{id}/roles",
            get(role::list_by_project).post(role::create),
        )
}
