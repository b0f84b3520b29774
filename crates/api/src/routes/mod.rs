pub mod admin;
pub mod health;
pub mod project;
pub mod role;
pub mod submission;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /admin/orphans                                   scan + auto-match (GET)
/// /admin/orphans/repair                            apply mappings (POST)
///
/// /projects                                        list, create
/// /projects/{id}                                   get
/// /projects/{id}/status                            booking <-> booked (PUT)
/// /projects/{id}/archive                           archive with cascade (POST)
/// /projects/{id}/restore                           restore with cascade (POST)
/// /projects/{project_id}/roles                     list, create
///
/// /roles/{id}                                      get, hard delete
/// /roles/{id}/archive                              archive individually (POST)
/// /roles/{id}/restore                              restore individually (POST)
///
/// /submissions                                     submit to a role (POST)
/// /submissions/{id}/status                         review status (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/admin", admin::router())
        .nest("/projects", project::router())
        .nest("/roles", role::router())
        .nest("/submissions", submission::router())
}
