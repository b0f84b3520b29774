//! Route definitions for the `/submissions` resource.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::submission;
use crate::state::AppState;

/// Routes mounted at `/submissions`.
///
/// ```text
/// POST   /                  -> create
/// PUT    /{id}/status       -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submission::create))
        .route("/{id}/status", put(submission::update_status))
}
