//! Orphan detection.
//!
//! An orphan is a booking or submission whose `role_id` does not name any row
//! in the roles collection, whatever that role's status. Rows with a missing
//! or blank `role_id` are orphans too: the check is "not in the valid set",
//! so it fails open.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::store::{BookingRecord, EntityStore, RoleRecord, RowFilter, SubmissionRecord};
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedBooking {
    pub id: EntityId,
    pub role_id: Option<EntityId>,
    pub user_id: EntityId,
    pub project_id: EntityId,
    pub talent_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedSubmission {
    pub id: EntityId,
    pub role_id: Option<EntityId>,
    pub user_id: EntityId,
    pub project_id: EntityId,
    /// The denormalized name of the vanished role, if the submission stored one.
    pub role_name: Option<String>,
}

/// One distinct dangling role id with everything known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedRole {
    pub old_role_id: EntityId,
    /// Distinct non-empty name hints, in discovery order.
    pub name_hints: Vec<String>,
    pub booking_count: usize,
    pub submission_count: usize,
}

impl OrphanedRole {
    /// The first name hint seen, used for operator prompts.
    pub fn display_name(&self) -> Option<&str> {
        self.name_hints.first().map(String::as_str)
    }
}

/// Orphans in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    pub orphaned_bookings: Vec<OrphanedBooking>,
    pub orphaned_submissions: Vec<OrphanedSubmission>,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.orphaned_bookings.is_empty() && self.orphaned_submissions.is_empty()
    }

    pub fn total(&self) -> usize {
        self.orphaned_bookings.len() + self.orphaned_submissions.len()
    }

    /// Group orphans by their dangling role id. Orphans without any role id
    /// cannot be remapped and are left out.
    pub fn distinct_role_ids(&self) -> Vec<OrphanedRole> {
        let mut by_role: IndexMap<&str, OrphanedRole> = IndexMap::new();

        fn entry<'m, 'a>(
            map: &'m mut IndexMap<&'a str, OrphanedRole>,
            role_id: &'a str,
        ) -> &'m mut OrphanedRole {
            map.entry(role_id).or_insert_with(|| OrphanedRole {
                old_role_id: role_id.to_string(),
                name_hints: Vec::new(),
                booking_count: 0,
                submission_count: 0,
            })
        }

        for booking in &self.orphaned_bookings {
            if let Some(role_id) = booking.role_id.as_deref() {
                entry(&mut by_role, role_id).booking_count += 1;
            }
        }
        for submission in &self.orphaned_submissions {
            let Some(role_id) = submission.role_id.as_deref() else {
                continue;
            };
            let role = entry(&mut by_role, role_id);
            role.submission_count += 1;
            if let Some(name) = submission.role_name.as_deref().map(str::trim) {
                if !name.is_empty() && !role.name_hints.iter().any(|h| h == name) {
                    role.name_hints.push(name.to_string());
                }
            }
        }

        by_role.into_values().collect()
    }
}

/// Compare foreign keys against the set of existing role ids.
pub fn find_orphans(
    roles: &[RoleRecord],
    bookings: &[BookingRecord],
    submissions: &[SubmissionRecord],
) -> OrphanReport {
    let valid: HashSet<&str> = roles.iter().map(|r| r.id.as_str()).collect();
    let is_orphan = |role_id: &Option<EntityId>| match role_id.as_deref() {
        Some(id) => !valid.contains(id),
        None => true,
    };

    let orphaned_bookings = bookings
        .iter()
        .filter(|b| is_orphan(&b.role_id))
        .map(|b| OrphanedBooking {
            id: b.id.clone(),
            role_id: b.role_id.clone(),
            user_id: b.user_id.clone(),
            project_id: b.project_id.clone(),
            talent_name: b.talent_name.clone(),
        })
        .collect();

    // The role name hint is only read here, after the foreign key is known broken.
    let orphaned_submissions = submissions
        .iter()
        .filter(|s| is_orphan(&s.role_id))
        .map(|s| OrphanedSubmission {
            id: s.id.clone(),
            role_id: s.role_id.clone(),
            user_id: s.user_id.clone(),
            project_id: s.project_id.clone(),
            role_name: s.role_name_hint.clone(),
        })
        .collect();

    OrphanReport {
        orphaned_bookings,
        orphaned_submissions,
    }
}

/// Read every role, booking and submission and report the orphans.
///
/// Read-only; safe to run as often as needed.
pub async fn scan_for_orphans<S>(store: &S) -> Result<OrphanReport, CoreError>
where
    S: EntityStore + ?Sized,
{
    let roles = store.list_roles(RowFilter::All).await?;
    let bookings = store.list_bookings(RowFilter::All).await?;
    let submissions = store.list_submissions(RowFilter::All).await?;

    let report = find_orphans(&roles, &bookings, &submissions);
    tracing::info!(
        roles = roles.len(),
        bookings = bookings.len(),
        submissions = submissions.len(),
        orphaned_bookings = report.orphaned_bookings.len(),
        orphaned_submissions = report.orphaned_submissions.len(),
        "Orphan scan complete",
    );
    Ok(report)
}
