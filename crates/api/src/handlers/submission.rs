//! Handlers for the `/submissions` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use casting_core::error::CoreError;
use casting_core::status::RoleStatus;
use casting_db::models::submission::{
    CreateSubmission, SubmitToRole, Submission, UpdateSubmissionStatus,
};
use casting_db::repositories::{ProfileRepo, RoleRepo, SubmissionRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/submissions
///
/// Copies the role's project and name onto the submission. A second
/// submission to the same role by the same user is a 409.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<SubmitToRole>,
) -> AppResult<(StatusCode, Json<DataResponse<Submission>>)> {
    let role = RoleRepo::find_by_id(&state.pool, &input.role_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Role", input.role_id.clone())))?;
    if role.status == RoleStatus::Archived.as_str() {
        return Err(AppError::Core(CoreError::Conflict(
            "This role is no longer accepting submissions".into(),
        )));
    }

    let profile_id = match input.profile_id {
        Some(id) => Some(id),
        None => ProfileRepo::find_by_user_id(&state.pool, &input.user_id)
            .await?
            .map(|p| p.id),
    };

    let create = CreateSubmission {
        user_id: input.user_id,
        role_id: role.id,
        project_id: role.project_id,
        profile_id,
        role_name: Some(role.name),
    };
    // A duplicate trips `uq_submissions_user_role`, which the error layer
    // turns into a 409 with a readable message.
    let submission = SubmissionRepo::create(&state.pool, &create).await?;

    tracing::info!(
        submission_id = %submission.id,
        role_id = ?submission.role_id,
        user_id = %submission.user_id,
        "Submission created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(submission))))
}

/// PUT /api/v1/submissions/{id}/status
///
/// Sets a review decision (`pinned`, `booked`, `rejected`) or clears it
/// with `null`.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateSubmissionStatus>,
) -> AppResult<Json<DataResponse<Submission>>> {
    if let Some(status) = input.status {
        if !status.is_review_decision() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Status '{status}' is set by archive and restore, not by review"
            ))));
        }
    }

    let submission = SubmissionRepo::set_status(&state.pool, &id, input.status, chrono::Utc::now())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Submission", id)))?;
    Ok(Json(DataResponse::new(submission)))
}
