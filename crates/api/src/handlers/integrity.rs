//! Handlers for orphan detection and repair.
//!
//! The scan is read-only. Repair rewrites `role_id` on bookings and
//! submissions, one batch per mapping, and reports partial progress if a
//! batch fails.

use axum::extract::State;
use axum::Json;
use casting_core::mapping::{auto_match, AutoMapping, MappingSet, RoleMapping, UnresolvedRole};
use casting_core::orphan::{scan_for_orphans, OrphanReport};
use casting_core::repoint::{repair, RepairReport};
use casting_core::store::RowFilter;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Scan result plus the mappings the resolver could propose on its own.
#[derive(Debug, Serialize)]
pub struct OrphanScan {
    #[serde(flatten)]
    pub report: OrphanReport,
    pub auto_mappings: Vec<AutoMapping>,
    pub unresolved: Vec<UnresolvedRole>,
}

/// Request body for a repair run.
#[derive(Debug, Deserialize)]
pub struct RepairRequest {
    pub mappings: Vec<RoleMapping>,
}

/// GET /api/v1/admin/orphans
pub async fn scan_orphans(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<OrphanScan>>> {
    let report = scan_for_orphans(state.store.as_ref()).await?;
    let roles = state.store.list_roles(RowFilter::All).await?;
    let matched = auto_match(&report, &roles);

    Ok(Json(DataResponse::new(OrphanScan {
        report,
        auto_mappings: matched.mappings,
        unresolved: matched.unresolved,
    })))
}

/// POST /api/v1/admin/orphans/repair
///
/// Returns 500 with the partial report if a mapping fails; mappings before it
/// stay applied. Submissions left behind by the one-submission-per-role rule
/// are listed in the outcomes of a normal 200 response.
pub async fn repair_orphans(
    State(state): State<AppState>,
    Json(input): Json<RepairRequest>,
) -> AppResult<Json<DataResponse<RepairReport>>> {
    if input.mappings.is_empty() {
        return Err(AppError::BadRequest(
            "At least one mapping is required".to_string(),
        ));
    }
    let mappings = MappingSet::from_mappings(input.mappings)?;

    tracing::info!(mappings = mappings.len(), "Starting orphan repair");
    let report = repair(state.store.as_ref(), &mappings, chrono::Utc::now()).await;

    if report.failure().is_some() {
        return Err(AppError::PartialRepair(Box::new(report)));
    }
    Ok(Json(DataResponse::new(report)))
}
