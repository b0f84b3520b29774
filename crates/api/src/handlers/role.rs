//! Handlers for roles, both project-scoped and by id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use casting_core::archive::{archive_role, restore_role, RoleArchiveReport};
use casting_core::error::CoreError;
use casting_core::status::ProjectStatus;
use casting_db::models::role::{CreateRole, Role};
use casting_db::repositories::{ProjectRepo, RoleRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for archiving a role. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct ArchiveRoleRequest {
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// GET /api/v1/projects/{id}/roles
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Role>>>> {
    ProjectRepo::find_by_id(&state.pool, &project_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Project", project_id.clone())))?;
    let roles = RoleRepo::list_by_project(&state.pool, &project_id).await?;
    Ok(Json(DataResponse::new(roles)))
}

/// POST /api/v1/projects/{id}/roles
pub async fn create(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<CreateRole>,
) -> AppResult<(StatusCode, Json<DataResponse<Role>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Role name is required".into(),
        )));
    }
    let project = ProjectRepo::find_by_id(&state.pool, &project_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Project", project_id.clone())))?;
    if project.status == ProjectStatus::Archived.as_str() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Project {project_id} is archived; restore it before adding roles"
        ))));
    }

    let role = RoleRepo::create(&state.pool, &project_id, &input).await?;
    tracing::info!(project_id = %project_id, role_id = %role.id, "Role created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(role))))
}

/// GET /api/v1/roles/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Role>>> {
    let role = RoleRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Role", id)))?;
    Ok(Json(DataResponse::new(role)))
}

/// DELETE /api/v1/roles/{id}
///
/// Hard delete. Bookings and submissions that referenced the role are kept
/// and show up in the next orphan scan.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if RoleRepo::hard_delete(&state.pool, &id).await? {
        tracing::warn!(role_id = %id, "Role deleted; referencing rows are now orphans");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Role", id)))
    }
}

/// POST /api/v1/roles/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ArchiveRoleRequest>,
) -> AppResult<Json<DataResponse<RoleArchiveReport>>> {
    let report = archive_role(
        state.store.as_ref(),
        &id,
        input.actor_id.as_deref(),
        input.reason.as_deref(),
        chrono::Utc::now(),
    )
    .await?;
    Ok(Json(DataResponse::new(report)))
}

/// POST /api/v1/roles/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<RoleArchiveReport>>> {
    let report = restore_role(state.store.as_ref(), &id, chrono::Utc::now()).await?;
    Ok(Json(DataResponse::new(report)))
}
