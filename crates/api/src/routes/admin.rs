//! Route definitions for referential-integrity administration.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::integrity;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /orphans              -> scan_orphans
/// POST   /orphans/repair       -> repair_orphans
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orphans", get(integrity::scan_orphans))
        .route("/orphans/repair", post(integrity::repair_orphans))
}
