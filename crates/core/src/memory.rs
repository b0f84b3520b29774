//! In-memory [`EntityStore`] for tests.
//!
//! Rows keep insertion order, which stands in for the backend's discovery
//! order. Collections can be dropped (to mimic a backend without a bookings
//! table) or made to fail, and individual repoint batches can be failed to
//! exercise partial repairs. Repoints honour the one-submission-per-talent-
//! per-role rule the way the database constraint does.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::store::{
    BookingPatch, BookingRecord, EntityStore, ProjectPatch, ProjectRecord, RepointBatch,
    RepointCounts, RolePatch, RoleRecord, RowFilter, StoreError, StoreResult, SubmissionPatch,
    SubmissionRecord, COLLECTION_BOOKINGS, COLLECTION_PROJECTS, COLLECTION_ROLES,
    COLLECTION_SUBMISSIONS,
};
use crate::types::EntityId;

#[derive(Default)]
struct Tables {
    projects: IndexMap<EntityId, ProjectRecord>,
    roles: IndexMap<EntityId, RoleRecord>,
    bookings: IndexMap<EntityId, BookingRecord>,
    submissions: IndexMap<EntityId, SubmissionRecord>,
    dropped: HashSet<&'static str>,
    failing: HashMap<&'static str, String>,
    failing_repoints: HashMap<EntityId, StoreError>,
}

impl Tables {
    fn check(&self, collection: &'static str) -> StoreResult<()> {
        if self.dropped.contains(collection) {
            return Err(StoreError::MissingCollection(collection));
        }
        if let Some(msg) = self.failing.get(collection) {
            return Err(StoreError::Backend(msg.clone()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Seeding --------------------------------------------------------

    pub fn insert_project(&self, project: ProjectRecord) {
        self.tables().projects.insert(project.id.clone(), project);
    }

    pub fn insert_role(&self, role: RoleRecord) {
        self.tables().roles.insert(role.id.clone(), role);
    }

    pub fn insert_booking(&self, booking: BookingRecord) {
        self.tables().bookings.insert(booking.id.clone(), booking);
    }

    pub fn insert_submission(&self, submission: SubmissionRecord) {
        self.tables()
            .submissions
            .insert(submission.id.clone(), submission);
    }

    /// Delete a role out-of-band, leaving its bookings and submissions behind.
    pub fn delete_role(&self, id: &str) -> Option<RoleRecord> {
        self.tables().roles.shift_remove(id)
    }

    // -- Fault injection ------------------------------------------------

    /// Make every call touching `collection` fail with `MissingCollection`.
    pub fn drop_collection(&self, collection: &'static str) {
        self.tables().dropped.insert(collection);
    }

    /// Make every call touching `collection` fail with a backend error.
    pub fn fail_collection(&self, collection: &'static str, message: &str) {
        self.tables().failing.insert(collection, message.to_string());
    }

    /// Make the repoint batch for `old_role_id` fail without applying anything.
    pub fn fail_repoint(&self, old_role_id: &str, message: &str) {
        self.tables().failing_repoints.insert(
            old_role_id.to_string(),
            StoreError::Backend(message.to_string()),
        );
    }

    /// Make the repoint batch for `old_role_id` fail on `constraint`.
    pub fn reject_repoint(&self, old_role_id: &str, constraint: &str) {
        self.tables().failing_repoints.insert(
            old_role_id.to_string(),
            StoreError::Constraint {
                constraint: constraint.to_string(),
                message: "duplicate key value violates unique constraint".to_string(),
            },
        );
    }

    // -- Inspection -----------------------------------------------------

    pub fn project(&self, id: &str) -> Option<ProjectRecord> {
        self.tables().projects.get(id).cloned()
    }

    pub fn role(&self, id: &str) -> Option<RoleRecord> {
        self.tables().roles.get(id).cloned()
    }

    pub fn booking(&self, id: &str) -> Option<BookingRecord> {
        self.tables().bookings.get(id).cloned()
    }

    pub fn submission(&self, id: &str) -> Option<SubmissionRecord> {
        self.tables().submissions.get(id).cloned()
    }

    pub fn roles(&self) -> Vec<RoleRecord> {
        self.tables().roles.values().cloned().collect()
    }

    pub fn bookings(&self) -> Vec<BookingRecord> {
        self.tables().bookings.values().cloned().collect()
    }

    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.tables().submissions.values().cloned().collect()
    }
}

fn matches_ref(role_id: &Option<EntityId>, wanted: &str) -> bool {
    role_id.as_deref() == Some(wanted)
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>> {
        let tables = self.tables();
        tables.check(COLLECTION_PROJECTS)?;
        Ok(tables.projects.get(id).cloned())
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> StoreResult<bool> {
        let mut tables = self.tables();
        tables.check(COLLECTION_PROJECTS)?;
        let Some(project) = tables.projects.get_mut(id) else {
            return Ok(false);
        };
        if let Some(status) = patch.status {
            project.status = status;
        }
        Ok(true)
    }

    async fn list_roles(&self, filter: RowFilter<'_>) -> StoreResult<Vec<RoleRecord>> {
        let tables = self.tables();
        tables.check(COLLECTION_ROLES)?;
        Ok(tables
            .roles
            .values()
            .filter(|r| match filter {
                RowFilter::All => true,
                RowFilter::ByRole(id) => r.id == id,
                RowFilter::ByProject(id) => r.project_id == id,
            })
            .cloned()
            .collect())
    }

    async fn list_bookings(&self, filter: RowFilter<'_>) -> StoreResult<Vec<BookingRecord>> {
        let tables = self.tables();
        tables.check(COLLECTION_BOOKINGS)?;
        Ok(tables
            .bookings
            .values()
            .filter(|b| match filter {
                RowFilter::All => true,
                RowFilter::ByRole(id) => matches_ref(&b.role_id, id),
                RowFilter::ByProject(id) => b.project_id == id,
            })
            .cloned()
            .collect())
    }

    async fn list_submissions(&self, filter: RowFilter<'_>) -> StoreResult<Vec<SubmissionRecord>> {
        let tables = self.tables();
        tables.check(COLLECTION_SUBMISSIONS)?;
        Ok(tables
            .submissions
            .values()
            .filter(|s| match filter {
                RowFilter::All => true,
                RowFilter::ByRole(id) => matches_ref(&s.role_id, id),
                RowFilter::ByProject(id) => s.project_id == id,
            })
            .cloned()
            .collect())
    }

    async fn update_roles(&self, ids: &[EntityId], patch: &RolePatch) -> StoreResult<u64> {
        let mut tables = self.tables();
        tables.check(COLLECTION_ROLES)?;
        let mut updated = 0;
        for id in ids {
            let Some(role) = tables.roles.get_mut(id) else {
                continue;
            };
            if let Some(status) = patch.status {
                role.status = status;
            }
            if let Some(flag) = patch.archived_with_project {
                role.archived_with_project = flag;
            }
            if let Some(flag) = patch.archived_individually {
                role.archived_individually = flag;
            }
            if let Some(archive) = &patch.archive {
                role.archive = archive.clone();
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn update_bookings(&self, ids: &[EntityId], patch: &BookingPatch) -> StoreResult<u64> {
        let mut tables = self.tables();
        tables.check(COLLECTION_BOOKINGS)?;
        let mut updated = 0;
        for id in ids {
            let Some(booking) = tables.bookings.get_mut(id) else {
                continue;
            };
            if let Some(status) = patch.status {
                booking.status = status;
            }
            if let Some(flag) = patch.archived_with_project {
                booking.archived_with_project = flag;
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn update_submissions(
        &self,
        ids: &[EntityId],
        patch: &SubmissionPatch,
    ) -> StoreResult<u64> {
        let mut tables = self.tables();
        tables.check(COLLECTION_SUBMISSIONS)?;
        let mut updated = 0;
        for id in ids {
            let Some(submission) = tables.submissions.get_mut(id) else {
                continue;
            };
            if let Some(status) = patch.status {
                submission.status = status;
            }
            if let Some(flag) = patch.archived_with_project {
                submission.archived_with_project = flag;
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn repoint_role(&self, batch: &RepointBatch) -> StoreResult<RepointCounts> {
        let mut tables = self.tables();
        if !batch.booking_ids.is_empty() {
            tables.check(COLLECTION_BOOKINGS)?;
        }
        if !batch.submission_ids.is_empty() {
            tables.check(COLLECTION_SUBMISSIONS)?;
        }
        if let Some(err) = tables.failing_repoints.get(&batch.old_role_id) {
            return Err(err.clone());
        }

        // Checked up front so a violation leaves the whole batch unapplied.
        let moving: Vec<&SubmissionRecord> = batch
            .submission_ids
            .iter()
            .filter_map(|id| tables.submissions.get(id))
            .filter(|s| matches_ref(&s.role_id, &batch.old_role_id))
            .collect();
        let duplicate = moving.iter().any(|m| {
            tables.submissions.values().any(|s| {
                s.id != m.id
                    && s.user_id == m.user_id
                    && matches_ref(&s.role_id, &batch.new_role_id)
            })
        });
        if duplicate {
            return Err(StoreError::Constraint {
                constraint: UQ_SUBMISSIONS_USER_ROLE.to_string(),
                message: format!(
                    "duplicate key value violates unique constraint \"{UQ_SUBMISSIONS_USER_ROLE}\""
                ),
            });
        }

        let mut counts = RepointCounts::default();
        for id in &batch.booking_ids {
            if let Some(booking) = tables.bookings.get_mut(id) {
                if matches_ref(&booking.role_id, &batch.old_role_id) {
                    booking.role_id = Some(batch.new_role_id.clone());
                    counts.bookings += 1;
                }
            }
        }
        for id in &batch.submission_ids {
            if let Some(submission) = tables.submissions.get_mut(id) {
                if matches_ref(&submission.role_id, &batch.old_role_id) {
                    submission.role_id = Some(batch.new_role_id.clone());
                    counts.submissions += 1;
                }
            }
        }
        Ok(counts)
    }
}

const UQ_SUBMISSIONS_USER_ROLE: &str = "uq_submissions_user_role";

/// Terse record constructors for seeding a [`MemoryStore`].
pub mod fixtures {
    use crate::status::{BookingStatus, ProjectStatus, RoleStatus, SubmissionStatus};
    use crate::store::{BookingRecord, ProjectRecord, RoleRecord, SubmissionRecord};

    pub fn project(id: &str, status: ProjectStatus) -> ProjectRecord {
        ProjectRecord {
            id: id.into(),
            title: format!("Project {id}"),
            status,
        }
    }

    pub fn role(id: &str, project_id: &str, name: &str) -> RoleRecord {
        RoleRecord {
            id: id.into(),
            project_id: project_id.into(),
            name: name.into(),
            status: RoleStatus::Booking,
            archived_with_project: false,
            archived_individually: false,
            archive: None,
        }
    }

    pub fn booking(id: &str, role_id: &str, project_id: &str) -> BookingRecord {
        BookingRecord {
            id: id.into(),
            role_id: Some(role_id.into()),
            user_id: format!("user-{id}"),
            project_id: project_id.into(),
            talent_name: Some(format!("Talent {id}")),
            status: BookingStatus::Confirmed,
            archived_with_project: false,
        }
    }

    pub fn submission(
        id: &str,
        role_id: &str,
        project_id: &str,
        status: Option<SubmissionStatus>,
    ) -> SubmissionRecord {
        SubmissionRecord {
            id: id.into(),
            role_id: Some(role_id.into()),
            user_id: format!("user-{id}"),
            project_id: project_id.into(),
            profile_id: None,
            role_name_hint: None,
            status,
            archived_with_project: false,
        }
    }

    /// A submission carrying the denormalized role name.
    pub fn named_submission(
        id: &str,
        role_id: &str,
        project_id: &str,
        role_name: &str,
    ) -> SubmissionRecord {
        SubmissionRecord {
            role_name_hint: Some(role_name.into()),
            ..submission(id, role_id, project_id, None)
        }
    }
}
