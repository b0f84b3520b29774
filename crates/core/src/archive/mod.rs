//! Archive / restore controller for projects and roles.
//!
//! Archival never deletes anything: it flips status columns and the two
//! archive flags. A project archive cascades to its roles, bookings and
//! submissions; each child collection is updated independently and its
//! result recorded in an [`ArchiveReport`], so a backend that lacks one
//! collection still archives the others.

pub mod state;

use serde::Serialize;

use crate::error::CoreError;
use crate::status::{BookingStatus, ProjectStatus, RoleStatus, SubmissionStatus};
use crate::store::{
    ArchiveMeta, BookingPatch, EntityStore, ProjectPatch, ProjectRecord, RolePatch, RowFilter,
    StoreError, StoreResult, SubmissionPatch, COLLECTION_BOOKINGS, COLLECTION_ROLES,
    COLLECTION_SUBMISSIONS,
};
use crate::types::{EntityId, Timestamp};

pub use state::ArchiveState;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of updating one child collection during a cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CollectionOutcome {
    Updated { count: u64 },
    /// The backend has no such collection; nothing to update.
    Missing,
    Failed { message: String },
}

impl CollectionOutcome {
    fn from_result(collection: &'static str, result: StoreResult<u64>) -> Self {
        match result {
            Ok(count) => CollectionOutcome::Updated { count },
            Err(StoreError::MissingCollection(_)) => {
                tracing::warn!(collection, "Collection missing from store, skipped");
                CollectionOutcome::Missing
            }
            Err(err) => {
                tracing::error!(collection, error = %err, "Cascade update failed");
                CollectionOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Rows updated; zero for missing or failed collections.
    pub fn count(&self) -> u64 {
        match self {
            CollectionOutcome::Updated { count } => *count,
            _ => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CollectionOutcome::Failed { .. })
    }
}

/// Summary of a project archive or restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    pub project_id: EntityId,
    pub project_status: ProjectStatus,
    pub roles: CollectionOutcome,
    pub bookings: CollectionOutcome,
    pub submissions: CollectionOutcome,
}

impl ArchiveReport {
    /// `true` when no child collection failed. Missing collections count as done.
    pub fn is_complete(&self) -> bool {
        !(self.roles.is_failed() || self.bookings.is_failed() || self.submissions.is_failed())
    }
}

/// Summary of an individual role archive or restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleArchiveReport {
    pub role_id: EntityId,
    pub status: RoleStatus,
    pub archive_state: ArchiveState,
    /// Submissions whose status was reset to unreviewed.
    pub submissions_reset: u64,
}

// ---------------------------------------------------------------------------
// Project archive / restore
// ---------------------------------------------------------------------------

/// Archive a project and cascade to its roles, bookings and submissions.
///
/// Re-archiving an archived project re-applies the same target state.
pub async fn archive_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> Result<ArchiveReport, CoreError>
where
    S: EntityStore + ?Sized,
{
    let project = load_project(store, project_id).await?;

    store
        .update_project(
            &project.id,
            &ProjectPatch {
                status: Some(ProjectStatus::Archived),
                updated_at: now,
            },
        )
        .await?;

    let roles = CollectionOutcome::from_result(
        COLLECTION_ROLES,
        archive_roles_with_project(store, project_id, now).await,
    );
    let bookings = CollectionOutcome::from_result(
        COLLECTION_BOOKINGS,
        archive_bookings_with_project(store, project_id, now).await,
    );
    let submissions = CollectionOutcome::from_result(
        COLLECTION_SUBMISSIONS,
        archive_submissions_with_project(store, project_id, now).await,
    );

    tracing::info!(
        project_id,
        roles = roles.count(),
        bookings = bookings.count(),
        submissions = submissions.count(),
        "Project archived",
    );

    Ok(ArchiveReport {
        project_id: project.id,
        project_status: ProjectStatus::Archived,
        roles,
        bookings,
        submissions,
    })
}

/// Restore an archived project to the active (`booking`) state.
///
/// Only children flagged `archived_with_project` are touched. Roles that were
/// also archived individually stay archived. Every flagged submission becomes
/// `selected` whatever it was before the archive.
pub async fn restore_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> Result<ArchiveReport, CoreError>
where
    S: EntityStore + ?Sized,
{
    let project = load_project(store, project_id).await?;
    if project.status != ProjectStatus::Archived {
        return Err(CoreError::Conflict(format!(
            "Project {project_id} is not archived (status: {})",
            project.status
        )));
    }

    let restored_status = ProjectStatus::restored();
    store
        .update_project(
            &project.id,
            &ProjectPatch {
                status: Some(restored_status),
                updated_at: now,
            },
        )
        .await?;

    let roles = CollectionOutcome::from_result(
        COLLECTION_ROLES,
        restore_roles_with_project(store, project_id, now).await,
    );
    let bookings = CollectionOutcome::from_result(
        COLLECTION_BOOKINGS,
        restore_bookings_with_project(store, project_id, now).await,
    );
    let submissions = CollectionOutcome::from_result(
        COLLECTION_SUBMISSIONS,
        restore_submissions_with_project(store, project_id, now).await,
    );

    tracing::info!(
        project_id,
        roles = roles.count(),
        bookings = bookings.count(),
        submissions = submissions.count(),
        "Project restored",
    );

    Ok(ArchiveReport {
        project_id: project.id,
        project_status: restored_status,
        roles,
        bookings,
        submissions,
    })
}

/// Move a live project between `booking` and `booked`.
///
/// Archival and restore have their own entry points because they cascade.
pub async fn transition_project<S>(
    store: &S,
    project_id: &str,
    target: ProjectStatus,
    now: Timestamp,
) -> Result<ProjectRecord, CoreError>
where
    S: EntityStore + ?Sized,
{
    if target == ProjectStatus::Archived {
        return Err(CoreError::Validation(
            "Use the archive action to archive a project".into(),
        ));
    }

    let mut project = load_project(store, project_id).await?;
    if project.status == ProjectStatus::Archived {
        return Err(CoreError::Conflict(format!(
            "Project {project_id} is archived; restore it first"
        )));
    }
    if !project.status.can_transition_to(target) {
        return Err(CoreError::Conflict(format!(
            "Project {project_id} cannot move from {} to {target}",
            project.status
        )));
    }

    store
        .update_project(
            &project.id,
            &ProjectPatch {
                status: Some(target),
                updated_at: now,
            },
        )
        .await?;
    project.status = target;
    Ok(project)
}

async fn load_project<S>(store: &S, project_id: &str) -> Result<ProjectRecord, CoreError>
where
    S: EntityStore + ?Sized,
{
    store
        .find_project(project_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", project_id))
}

async fn archive_roles_with_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> StoreResult<u64>
where
    S: EntityStore + ?Sized,
{
    let ids: Vec<EntityId> = store
        .list_roles(RowFilter::ByProject(project_id))
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }
    let patch = RolePatch {
        status: Some(RoleStatus::Archived),
        archived_with_project: Some(true),
        ..RolePatch::at(now)
    };
    store.update_roles(&ids, &patch).await
}

async fn archive_bookings_with_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> StoreResult<u64>
where
    S: EntityStore + ?Sized,
{
    let ids: Vec<EntityId> = store
        .list_bookings(RowFilter::ByProject(project_id))
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }
    let patch = BookingPatch {
        status: Some(BookingStatus::Completed),
        archived_with_project: Some(true),
        updated_at: now,
    };
    store.update_bookings(&ids, &patch).await
}

async fn archive_submissions_with_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> StoreResult<u64>
where
    S: EntityStore + ?Sized,
{
    let ids: Vec<EntityId> = store
        .list_submissions(RowFilter::ByProject(project_id))
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }
    let patch = SubmissionPatch {
        status: Some(Some(SubmissionStatus::Archived)),
        archived_with_project: Some(true),
        updated_at: now,
    };
    store.update_submissions(&ids, &patch).await
}

async fn restore_roles_with_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> StoreResult<u64>
where
    S: EntityStore + ?Sized,
{
    let roles = store.list_roles(RowFilter::ByProject(project_id)).await?;

    let mut reopen = Vec::new();
    let mut unflag_only = Vec::new();
    for role in roles {
        if !role.archived_with_project {
            continue;
        }
        match role.archive_state().with_project_cascade(false) {
            ArchiveState::Active => reopen.push(role.id),
            _ => unflag_only.push(role.id),
        }
    }

    let mut updated = 0;
    if !reopen.is_empty() {
        let patch = RolePatch {
            status: Some(RoleStatus::Booking),
            archived_with_project: Some(false),
            ..RolePatch::at(now)
        };
        updated += store.update_roles(&reopen, &patch).await?;
    }
    if !unflag_only.is_empty() {
        let patch = RolePatch {
            archived_with_project: Some(false),
            ..RolePatch::at(now)
        };
        updated += store.update_roles(&unflag_only, &patch).await?;
    }
    Ok(updated)
}

async fn restore_bookings_with_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> StoreResult<u64>
where
    S: EntityStore + ?Sized,
{
    let ids: Vec<EntityId> = store
        .list_bookings(RowFilter::ByProject(project_id))
        .await?
        .into_iter()
        .filter(|b| b.archived_with_project)
        .map(|b| b.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }
    let patch = BookingPatch {
        status: Some(BookingStatus::Confirmed),
        archived_with_project: Some(false),
        updated_at: now,
    };
    store.update_bookings(&ids, &patch).await
}

async fn restore_submissions_with_project<S>(
    store: &S,
    project_id: &str,
    now: Timestamp,
) -> StoreResult<u64>
where
    S: EntityStore + ?Sized,
{
    let ids: Vec<EntityId> = store
        .list_submissions(RowFilter::ByProject(project_id))
        .await?
        .into_iter()
        .filter(|s| s.archived_with_project)
        .map(|s| s.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }
    let patch = SubmissionPatch {
        status: Some(Some(SubmissionStatus::Selected)),
        archived_with_project: Some(false),
        updated_at: now,
    };
    store.update_submissions(&ids, &patch).await
}

// ---------------------------------------------------------------------------
// Role archive / restore
// ---------------------------------------------------------------------------

/// Archive a single role, independent of its project.
///
/// The role's submissions are reset to unreviewed (NULL status), never
/// deleted. The project's own status is not touched.
pub async fn archive_role<S>(
    store: &S,
    role_id: &str,
    actor_id: Option<&str>,
    reason: Option<&str>,
    now: Timestamp,
) -> Result<RoleArchiveReport, CoreError>
where
    S: EntityStore + ?Sized,
{
    let role = store
        .find_role(role_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Role", role_id))?;
    if role.archived_individually {
        return Err(CoreError::Conflict(format!(
            "Role {role_id} is already archived"
        )));
    }

    let archive_state = role.archive_state().with_individual(true);
    let patch = RolePatch {
        status: Some(RoleStatus::Archived),
        archived_individually: Some(true),
        archive: Some(Some(ArchiveMeta {
            reason: reason.map(str::to_string),
            archived_at: now,
            archived_by: actor_id.map(str::to_string),
        })),
        ..RolePatch::at(now)
    };
    store.update_roles(std::slice::from_ref(&role.id), &patch).await?;

    let submission_ids: Vec<EntityId> = store
        .list_submissions(RowFilter::ByRole(role_id))
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let submissions_reset = if submission_ids.is_empty() {
        0
    } else {
        let patch = SubmissionPatch {
            status: Some(None),
            archived_with_project: None,
            updated_at: now,
        };
        store.update_submissions(&submission_ids, &patch).await?
    };

    tracing::info!(role_id, actor_id, submissions_reset, "Role archived");

    Ok(RoleArchiveReport {
        role_id: role.id,
        status: RoleStatus::Archived,
        archive_state,
        submissions_reset,
    })
}

/// Restore an individually archived role.
///
/// Submissions stay unreviewed. A role whose project is still archived keeps
/// its `archived` status until the project is restored.
pub async fn restore_role<S>(
    store: &S,
    role_id: &str,
    now: Timestamp,
) -> Result<RoleArchiveReport, CoreError>
where
    S: EntityStore + ?Sized,
{
    let role = store
        .find_role(role_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Role", role_id))?;
    if !role.archived_individually {
        let msg = if role.archived_with_project {
            format!("Role {role_id} is archived with its project; restore the project instead")
        } else {
            format!("Role {role_id} is not archived")
        };
        return Err(CoreError::Conflict(msg));
    }

    let archive_state = role.archive_state().with_individual(false);
    let status = if archive_state.is_archived() {
        RoleStatus::Archived
    } else {
        RoleStatus::Booking
    };
    let patch = RolePatch {
        status: Some(status),
        archived_individually: Some(false),
        archive: Some(None),
        ..RolePatch::at(now)
    };
    store.update_roles(std::slice::from_ref(&role.id), &patch).await?;

    tracing::info!(role_id, status = %status, "Role restored");

    Ok(RoleArchiveReport {
        role_id: role.id,
        status,
        archive_state,
        submissions_reset: 0,
    })
}
