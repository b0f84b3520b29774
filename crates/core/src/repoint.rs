//! Batch repointing of orphaned bookings and submissions.
//!
//! Each mapping is applied in its own batched write, after re-reading the rows
//! that currently reference the old role id. There is no transaction spanning
//! mappings and no rollback: the first backend failure stops the run, earlier
//! mappings stay applied, and the report says exactly how far it got.
//! Re-running the scan and repair is the recovery path.
//!
//! A talent may hold only one submission per role. When the talent already
//! applied to the new role, the orphaned submission is left in place and
//! listed in the outcome instead of being moved. A constraint rejection of a
//! whole batch is recorded against that mapping and the run continues.

use std::collections::HashSet;

use serde::Serialize;

use crate::mapping::MappingSet;
use crate::store::{EntityStore, RepointBatch, RowFilter, StoreError, StoreResult};
use crate::types::{EntityId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MappingState {
    Applied,
    Failed { message: String },
    /// The store rejected the batch on a constraint. Nothing was written for
    /// this mapping; later mappings still run.
    Conflict { constraint: String, message: String },
    /// Not attempted because an earlier mapping failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingOutcome {
    pub old_role_id: EntityId,
    pub new_role_id: EntityId,
    /// Rows referencing the old id at rewrite time.
    pub bookings_found: u64,
    pub submissions_found: u64,
    pub bookings_updated: u64,
    pub submissions_updated: u64,
    /// Orphaned submissions not moved because the same talent already has a
    /// submission on the new role.
    pub conflicting_submission_ids: Vec<EntityId>,
    #[serde(flatten)]
    pub state: MappingState,
}

impl MappingOutcome {
    fn pending(old_role_id: &str, new_role_id: &str) -> Self {
        Self {
            old_role_id: old_role_id.to_string(),
            new_role_id: new_role_id.to_string(),
            bookings_found: 0,
            submissions_found: 0,
            bookings_updated: 0,
            submissions_updated: 0,
            conflicting_submission_ids: Vec::new(),
            state: MappingState::Skipped,
        }
    }

    /// The store changed fewer (or more) rows than were sent for this mapping.
    pub fn has_mismatch(&self) -> bool {
        let submissions_sent = self
            .submissions_found
            .saturating_sub(self.conflicting_submission_ids.len() as u64);
        self.state == MappingState::Applied
            && (self.bookings_found != self.bookings_updated
                || submissions_sent != self.submissions_updated)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicting_submission_ids.is_empty()
            || matches!(self.state, MappingState::Conflict { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub bookings_updated: u64,
    pub submissions_updated: u64,
    pub outcomes: Vec<MappingOutcome>,
}

impl RepairReport {
    /// The mapping that stopped the run, if any.
    pub fn failure(&self) -> Option<&MappingOutcome> {
        self.outcomes
            .iter()
            .find(|o| matches!(o.state, MappingState::Failed { .. }))
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &MappingOutcome> {
        self.outcomes.iter().filter(|o| o.has_mismatch())
    }

    /// Mappings that left rows behind because of the one-submission-per-role rule.
    pub fn conflicts(&self) -> impl Iterator<Item = &MappingOutcome> {
        self.outcomes.iter().filter(|o| o.has_conflicts())
    }

    /// Every mapping was applied and every found row was rewritten.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| {
            o.state == MappingState::Applied && !o.has_mismatch() && !o.has_conflicts()
        })
    }

    pub fn total_updated(&self) -> u64 {
        self.bookings_updated + self.submissions_updated
    }
}

/// Rewrite `role_id` on every booking and submission referencing a mapped old id.
pub async fn repair<S>(store: &S, mappings: &MappingSet, now: Timestamp) -> RepairReport
where
    S: EntityStore + ?Sized,
{
    let mut report = RepairReport::default();
    let mut failed = false;

    for (old_role_id, new_role_id) in mappings.iter() {
        let mut outcome = MappingOutcome::pending(old_role_id, new_role_id);
        if failed {
            report.outcomes.push(outcome);
            continue;
        }

        match apply_mapping(store, old_role_id, new_role_id, now, &mut outcome).await {
            Ok(()) => {
                outcome.state = MappingState::Applied;
                report.bookings_updated += outcome.bookings_updated;
                report.submissions_updated += outcome.submissions_updated;
                if outcome.has_conflicts() {
                    tracing::warn!(
                        old_role_id,
                        new_role_id,
                        conflicting = ?outcome.conflicting_submission_ids,
                        "Talent already submitted to the new role, submissions left in place",
                    );
                }
                if outcome.has_mismatch() {
                    tracing::warn!(
                        old_role_id,
                        new_role_id,
                        bookings_found = outcome.bookings_found,
                        bookings_updated = outcome.bookings_updated,
                        submissions_found = outcome.submissions_found,
                        submissions_updated = outcome.submissions_updated,
                        "Repointed row count differs from rows found",
                    );
                } else {
                    tracing::info!(
                        old_role_id,
                        new_role_id,
                        bookings = outcome.bookings_updated,
                        submissions = outcome.submissions_updated,
                        "Mapping applied",
                    );
                }
            }
            Err(StoreError::Constraint {
                constraint,
                message,
            }) => {
                tracing::warn!(
                    old_role_id,
                    new_role_id,
                    constraint = %constraint,
                    "Mapping rejected by constraint, continuing",
                );
                outcome.state = MappingState::Conflict {
                    constraint,
                    message,
                };
            }
            Err(err) => {
                tracing::error!(
                    old_role_id,
                    new_role_id,
                    error = %err,
                    "Mapping failed, stopping repair",
                );
                outcome.state = MappingState::Failed {
                    message: err.to_string(),
                };
                failed = true;
            }
        }
        report.outcomes.push(outcome);
    }

    report
}

async fn apply_mapping<S>(
    store: &S,
    old_role_id: &str,
    new_role_id: &str,
    now: Timestamp,
    outcome: &mut MappingOutcome,
) -> StoreResult<()>
where
    S: EntityStore + ?Sized,
{
    // Re-read at rewrite time rather than trusting the scan snapshot.
    let booking_ids: Vec<EntityId> =
        match store.list_bookings(RowFilter::ByRole(old_role_id)).await {
            Ok(rows) => rows.into_iter().map(|b| b.id).collect(),
            Err(StoreError::MissingCollection(_)) => Vec::new(),
            Err(err) => return Err(err),
        };
    let submissions = store.list_submissions(RowFilter::ByRole(old_role_id)).await?;
    outcome.submissions_found = submissions.len() as u64;

    let already_submitted: HashSet<EntityId> = store
        .list_submissions(RowFilter::ByRole(new_role_id))
        .await?
        .into_iter()
        .map(|s| s.user_id)
        .collect();
    let mut submission_ids = Vec::new();
    for submission in submissions {
        if already_submitted.contains(&submission.user_id) {
            outcome.conflicting_submission_ids.push(submission.id);
        } else {
            submission_ids.push(submission.id);
        }
    }

    outcome.bookings_found = booking_ids.len() as u64;
    if booking_ids.is_empty() && submission_ids.is_empty() {
        return Ok(());
    }

    let counts = store
        .repoint_role(&RepointBatch {
            old_role_id: old_role_id.to_string(),
            new_role_id: new_role_id.to_string(),
            booking_ids,
            submission_ids,
            updated_at: now,
        })
        .await?;
    outcome.bookings_updated = counts.bookings;
    outcome.submissions_updated = counts.submissions;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::mapping::auto_match;
    use crate::memory::{fixtures, MemoryStore};
    use crate::orphan::scan_for_orphans;
    use crate::status::ProjectStatus;
    use crate::store::{SubmissionRecord, COLLECTION_BOOKINGS};

    fn now() -> Timestamp {
        chrono::Utc::now()
    }

    /// Role `r1` ("Bartender") was deleted and recreated as `r2`.
    fn recreated_role_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_project(fixtures::project("p1", ProjectStatus::Booking));
        store.insert_role(fixtures::role("r2", "p1", "Bartender"));
        store.insert_submission(fixtures::named_submission("s1", "r1", "p1", "Bartender"));
        store
    }

    #[tokio::test]
    async fn scan_automatch_repair_closes_orphans() {
        let store = recreated_role_store();

        let report = scan_for_orphans(&store).await.unwrap();
        assert_eq!(report.orphaned_submissions.len(), 1);

        let outcome = auto_match(&report, &store.roles());
        let mappings = outcome.mapping_set();
        assert_eq!(mappings.get("r1"), Some("r2"));

        let repair_report = repair(&store, &mappings, now()).await;
        assert!(repair_report.is_complete());
        assert_eq!(repair_report.submissions_updated, 1);
        assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("r2"));

        assert!(scan_for_orphans(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ambiguous_names_leave_orphan_unrepaired() {
        let store = recreated_role_store();
        store.insert_role(fixtures::role("r3", "p1", "Bartender"));

        let report = scan_for_orphans(&store).await.unwrap();
        let mappings = auto_match(&report, &store.roles()).mapping_set();
        assert!(mappings.is_empty());

        let repair_report = repair(&store, &mappings, now()).await;
        assert_eq!(repair_report.total_updated(), 0);
        assert_eq!(scan_for_orphans(&store).await.unwrap().total(), 1);
    }

    #[tokio::test]
    async fn repair_is_idempotent() {
        let store = recreated_role_store();
        store.insert_booking(fixtures::booking("b1", "r1", "p1"));
        let mapping = crate::mapping::parse_mapping("r1:r2").unwrap();
        let mappings = MappingSet::from_mappings([mapping]).unwrap();

        let first = repair(&store, &mappings, now()).await;
        let after_first = (store.bookings(), store.submissions());
        let second = repair(&store, &mappings, now()).await;

        assert_eq!(first.total_updated(), 2);
        assert_eq!(second.total_updated(), 0);
        assert!(second.is_complete());
        assert_eq!((store.bookings(), store.submissions()), after_first);
    }

    #[tokio::test]
    async fn failure_stops_run_and_keeps_earlier_mappings() {
        let store = MemoryStore::new();
        store.insert_submission(fixtures::submission("s1", "a", "p1", None));
        store.insert_submission(fixtures::submission("s2", "b", "p1", None));
        store.insert_submission(fixtures::submission("s3", "c", "p1", None));
        store.fail_repoint("b", "connection reset");

        let mut mappings = MappingSet::new();
        mappings.set("a", "a2").unwrap();
        mappings.set("b", "b2").unwrap();
        mappings.set("c", "c2").unwrap();

        let report = repair(&store, &mappings, now()).await;

        assert!(!report.is_complete());
        assert_eq!(report.submissions_updated, 1);
        assert_eq!(report.outcomes[0].state, MappingState::Applied);
        assert_matches!(
            &report.outcomes[1].state,
            MappingState::Failed { message } if message.contains("connection reset")
        );
        assert_eq!(report.outcomes[2].state, MappingState::Skipped);
        assert_eq!(report.failure().unwrap().old_role_id, "b");

        assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("a2"));
        assert_eq!(store.submission("s2").unwrap().role_id.as_deref(), Some("b"));
        assert_eq!(store.submission("s3").unwrap().role_id.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn missing_bookings_collection_still_repoints_submissions() {
        let store = recreated_role_store();
        store.drop_collection(COLLECTION_BOOKINGS);
        let mut mappings = MappingSet::new();
        mappings.set("r1", "r2").unwrap();

        let report = repair(&store, &mappings, now()).await;

        assert!(report.is_complete());
        assert_eq!(report.outcomes[0].bookings_found, 0);
        assert_eq!(report.submissions_updated, 1);
    }

    #[tokio::test]
    async fn talent_with_submission_on_new_role_is_left_in_place() {
        let store = recreated_role_store();
        store.insert_booking(fixtures::booking("b1", "r1", "p1"));
        // The talent behind s1 applied again after r1 was recreated as r2.
        store.insert_submission(SubmissionRecord {
            user_id: "user-s1".into(),
            ..fixtures::submission("s2", "r2", "p1", None)
        });
        store.insert_submission(fixtures::submission("s3", "x", "p1", None));
        let mut mappings = MappingSet::new();
        mappings.set("r1", "r2").unwrap();
        mappings.set("x", "r2").unwrap();

        let report = repair(&store, &mappings, now()).await;

        assert!(report.failure().is_none());
        assert!(!report.is_complete());
        let first = &report.outcomes[0];
        assert_eq!(first.state, MappingState::Applied);
        assert_eq!(first.bookings_updated, 1);
        assert_eq!(first.submissions_updated, 0);
        assert_eq!(first.conflicting_submission_ids, ["s1"]);
        assert!(!first.has_mismatch());
        assert_eq!(report.outcomes[1].state, MappingState::Applied);
        assert_eq!(report.outcomes[1].submissions_updated, 1);
        assert_eq!(report.conflicts().count(), 1);

        assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r2"));
        assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("r1"));
        assert_eq!(store.submission("s3").unwrap().role_id.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn constraint_rejection_does_not_stop_later_mappings() {
        let store = MemoryStore::new();
        store.insert_submission(fixtures::submission("s1", "a", "p1", None));
        store.insert_submission(fixtures::submission("s2", "b", "p1", None));
        store.reject_repoint("a", "uq_submissions_user_role");

        let mut mappings = MappingSet::new();
        mappings.set("a", "a2").unwrap();
        mappings.set("b", "b2").unwrap();

        let report = repair(&store, &mappings, now()).await;

        assert!(report.failure().is_none());
        assert_matches!(
            &report.outcomes[0].state,
            MappingState::Conflict { constraint, .. } if constraint == "uq_submissions_user_role"
        );
        assert_eq!(report.outcomes[1].state, MappingState::Applied);
        assert_eq!(report.submissions_updated, 1);
        assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("a"));
        assert_eq!(store.submission("s2").unwrap().role_id.as_deref(), Some("b2"));
    }

    #[test]
    fn mismatch_is_detected() {
        let outcome = MappingOutcome {
            bookings_found: 2,
            bookings_updated: 1,
            state: MappingState::Applied,
            ..MappingOutcome::pending("a", "b")
        };
        assert!(outcome.has_mismatch());
        let report = RepairReport {
            bookings_updated: 1,
            submissions_updated: 0,
            outcomes: vec![outcome],
        };
        assert!(!report.is_complete());
        assert_eq!(report.mismatches().count(), 1);
    }
}
