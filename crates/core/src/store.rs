//! The entity store boundary.
//!
//! [`EntityStore`] is the only way domain logic reads or writes projects,
//! roles, bookings and submissions. It is the typed form of the backend's
//! `list(collection, filter)`, `update(collection, id, patch)` and
//! `batchUpdate([...])` calls: lists take a [`RowFilter`], updates take a set
//! of ids plus a patch, and [`EntityStore::repoint_role`] is one batched
//! write.

use async_trait::async_trait;
use serde::Serialize;

use crate::archive::ArchiveState;
use crate::status::{BookingStatus, ProjectStatus, RoleStatus, SubmissionStatus};
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The parts of a project the integrity and archival workflows act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub id: EntityId,
    pub title: String,
    pub status: ProjectStatus,
}

/// Who archived a role individually, when, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveMeta {
    pub reason: Option<String>,
    pub archived_at: Timestamp,
    pub archived_by: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRecord {
    pub id: EntityId,
    pub project_id: EntityId,
    pub name: String,
    pub status: RoleStatus,
    pub archived_with_project: bool,
    pub archived_individually: bool,
    pub archive: Option<ArchiveMeta>,
}

impl RoleRecord {
    pub fn archive_state(&self) -> ArchiveState {
        ArchiveState::from_flags(self.archived_with_project, self.archived_individually)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRecord {
    pub id: EntityId,
    /// `None` when the stored value is missing or empty.
    pub role_id: Option<EntityId>,
    pub user_id: EntityId,
    pub project_id: EntityId,
    pub talent_name: Option<String>,
    pub status: BookingStatus,
    pub archived_with_project: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRecord {
    pub id: EntityId,
    /// `None` when the stored value is missing or empty.
    pub role_id: Option<EntityId>,
    pub user_id: EntityId,
    pub project_id: EntityId,
    pub profile_id: Option<EntityId>,
    /// Denormalized role name, a recovery hint only. Read it solely when
    /// `role_id` is already known not to resolve.
    pub role_name_hint: Option<String>,
    pub status: Option<SubmissionStatus>,
    pub archived_with_project: bool,
}

/// Normalise a raw foreign key: blank values count as missing.
pub fn normalize_ref(raw: Option<String>) -> Option<EntityId> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Filters and patches
// ---------------------------------------------------------------------------

/// Row selection for list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter<'a> {
    All,
    /// Rows whose `role_id` equals the id (for roles: the role itself).
    ByRole(&'a str),
    /// Rows whose `project_id` equals the id.
    ByProject(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPatch {
    pub status: Option<ProjectStatus>,
    pub updated_at: Timestamp,
}

/// Changes applied to a set of roles. `None` leaves a field untouched;
/// `archive: Some(None)` clears the archive metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RolePatch {
    pub status: Option<RoleStatus>,
    pub archived_with_project: Option<bool>,
    pub archived_individually: Option<bool>,
    pub archive: Option<Option<ArchiveMeta>>,
    pub updated_at: Timestamp,
}

impl RolePatch {
    pub fn at(updated_at: Timestamp) -> Self {
        Self {
            status: None,
            archived_with_project: None,
            archived_individually: None,
            archive: None,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub archived_with_project: Option<bool>,
    pub updated_at: Timestamp,
}

/// Changes applied to a set of submissions. `status: Some(None)` resets the
/// status to NULL (unreviewed).
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPatch {
    pub status: Option<Option<SubmissionStatus>>,
    pub archived_with_project: Option<bool>,
    pub updated_at: Timestamp,
}

/// One batched rewrite of `role_id` for a single mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RepointBatch {
    pub old_role_id: EntityId,
    pub new_role_id: EntityId,
    pub booking_ids: Vec<EntityId>,
    pub submission_ids: Vec<EntityId>,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepointCounts {
    pub bookings: u64,
    pub submissions: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Logical collection names, used in errors and reports.
pub const COLLECTION_PROJECTS: &str = "projects";
pub const COLLECTION_ROLES: &str = "roles";
pub const COLLECTION_BOOKINGS: &str = "bookings";
pub const COLLECTION_SUBMISSIONS: &str = "submissions";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend has no such collection/table.
    #[error("Collection '{0}' does not exist in this store")]
    MissingCollection(&'static str),

    /// A uniqueness or other constraint rejected the write.
    #[error("Constraint '{constraint}' violated: {message}")]
    Constraint { constraint: String, message: String },

    /// A stored row could not be mapped onto a record.
    #[error("Malformed {collection} row {id}: {message}")]
    Decode {
        collection: &'static str,
        id: EntityId,
        message: String,
    },

    /// Any other backend failure (connection loss, timeouts, ...).
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>>;

    /// Returns `false` if no project with `id` exists.
    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> StoreResult<bool>;

    async fn list_roles(&self, filter: RowFilter<'_>) -> StoreResult<Vec<RoleRecord>>;

    async fn list_bookings(&self, filter: RowFilter<'_>) -> StoreResult<Vec<BookingRecord>>;

    async fn list_submissions(&self, filter: RowFilter<'_>) -> StoreResult<Vec<SubmissionRecord>>;

    /// Apply `patch` to every role in `ids`, returning the number of rows changed.
    async fn update_roles(&self, ids: &[EntityId], patch: &RolePatch) -> StoreResult<u64>;

    async fn update_bookings(&self, ids: &[EntityId], patch: &BookingPatch) -> StoreResult<u64>;

    async fn update_submissions(
        &self,
        ids: &[EntityId],
        patch: &SubmissionPatch,
    ) -> StoreResult<u64>;

    /// Rewrite `role_id` from `old_role_id` to `new_role_id` on the listed
    /// bookings and submissions as a single atomic write. Rows whose
    /// `role_id` no longer equals `old_role_id` are left alone.
    async fn repoint_role(&self, batch: &RepointBatch) -> StoreResult<RepointCounts>;

    async fn find_role(&self, id: &str) -> StoreResult<Option<RoleRecord>> {
        Ok(self.list_roles(RowFilter::ByRole(id)).await?.into_iter().next())
    }
}
