//! Submission entity model and DTOs.

use casting_core::status::{parse_submission_status, SubmissionStatus};
use casting_core::store::{normalize_ref, StoreError, SubmissionRecord, COLLECTION_SUBMISSIONS};
use casting_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::decode_error;

/// A submission row from the `submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: EntityId,
    pub user_id: EntityId,
    pub role_id: Option<EntityId>,
    pub project_id: EntityId,
    pub profile_id: Option<EntityId>,
    /// Role name copied at submission time, kept for orphan recovery.
    pub role_name: Option<String>,
    /// `None` means not yet reviewed.
    pub status: Option<String>,
    pub archived_with_project: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO. `project_id` and `role_name` are copied from the role.
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub user_id: EntityId,
    pub role_id: EntityId,
    pub project_id: EntityId,
    pub profile_id: Option<EntityId>,
    pub role_name: Option<String>,
}

/// Request body for submitting to a role.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitToRole {
    pub user_id: EntityId,
    pub role_id: EntityId,
    pub profile_id: Option<EntityId>,
}

/// Request body for a review status change. `null` clears the status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubmissionStatus {
    pub status: Option<SubmissionStatus>,
}

impl TryFrom<Submission> for SubmissionRecord {
    type Error = StoreError;

    fn try_from(row: Submission) -> Result<Self, Self::Error> {
        let status = parse_submission_status(row.status.as_deref())
            .map_err(|e| decode_error(COLLECTION_SUBMISSIONS, &row.id, e))?;
        Ok(SubmissionRecord {
            id: row.id,
            role_id: normalize_ref(row.role_id),
            user_id: row.user_id,
            project_id: row.project_id,
            profile_id: row.profile_id,
            role_name_hint: row.role_name,
            status,
            archived_with_project: row.archived_with_project,
        })
    }
}
