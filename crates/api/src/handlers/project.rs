//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use casting_core::archive::{archive_project, restore_project, transition_project, ArchiveReport};
use casting_core::error::CoreError;
use casting_core::status::ProjectStatus;
use casting_core::store::ProjectRecord;
use casting_db::models::project::{CreateProject, Project};
use casting_db::repositories::ProjectRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the project listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectStatus {
    pub status: ProjectStatus,
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Project title is required".into(),
        )));
    }
    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = %project.id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(project))))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListProjectsQuery>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool, params.include_archived).await?;
    Ok(Json(DataResponse::new(projects)))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Project", id)))?;
    Ok(Json(DataResponse::new(project)))
}

/// PUT /api/v1/projects/{id}/status
///
/// Only the `booking <-> booked` edge; archival has its own endpoints.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProjectStatus>,
) -> AppResult<Json<DataResponse<ProjectRecord>>> {
    let project =
        transition_project(state.store.as_ref(), &id, input.status, chrono::Utc::now()).await?;
    Ok(Json(DataResponse::new(project)))
}

/// POST /api/v1/projects/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ArchiveReport>>> {
    let report = archive_project(state.store.as_ref(), &id, chrono::Utc::now()).await?;
    Ok(Json(DataResponse::new(report)))
}

/// POST /api/v1/projects/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ArchiveReport>>> {
    let report = restore_project(state.store.as_ref(), &id, chrono::Utc::now()).await?;
    Ok(Json(DataResponse::new(report)))
}
