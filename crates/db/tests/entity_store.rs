//! Integration tests for the Postgres entity store.
//!
//! Exercises the repositories and `PgEntityStore` against a real database to
//! verify that:
//! - Orphans left by a deleted role are found and repointed by name
//! - Repair is idempotent, and a talent's duplicate submission stays in place
//! - Project archive and restore round-trip every child row
//! - A missing bookings table is reported, not fatal
//! - The `uq_submissions_user_role` violation maps to a constraint error

use assert_matches::assert_matches;
use casting_core::archive::{archive_project, archive_role, restore_project, CollectionOutcome};
use casting_core::mapping::{auto_match, MappingSet};
use casting_core::orphan::scan_for_orphans;
use casting_core::repoint::{repair, MappingState};
use casting_core::status::{BookingStatus, ProjectStatus, RoleStatus, SubmissionStatus};
use casting_core::store::{EntityStore, StoreError};
use casting_db::models::booking::CreateBooking;
use casting_db::models::photo::CreatePhoto;
use casting_db::models::profile::CreateProfile;
use casting_db::models::project::CreateProject;
use casting_db::models::role::CreateRole;
use casting_db::models::submission::CreateSubmission;
use casting_db::repositories::{
    BookingRepo, PhotoRepo, ProfileRepo, ProjectRepo, RoleRepo, SubmissionRepo,
};
use casting_db::PgEntityStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_project(pool: &PgPool, title: &str) -> String {
    ProjectRepo::create(
        pool,
        &CreateProject {
            title: title.to_string(),
            project_type: "film".to_string(),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_role(pool: &PgPool, project_id: &str, name: &str) -> String {
    RoleRepo::create(
        pool,
        project_id,
        &CreateRole {
            name: name.to_string(),
            requirements: None,
            rate: Some("$200/day".to_string()),
            booking_dates: Vec::new(),
            location: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_submission(
    pool: &PgPool,
    user_id: &str,
    role_id: &str,
    project_id: &str,
    role_name: &str,
) -> String {
    SubmissionRepo::create(
        pool,
        &CreateSubmission {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
            project_id: project_id.to_string(),
            profile_id: None,
            role_name: Some(role_name.to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_booking(pool: &PgPool, role_id: &str, project_id: &str) -> String {
    BookingRepo::create(
        pool,
        &CreateBooking {
            user_id: "user-b".to_string(),
            role_id: Some(role_id.to_string()),
            project_id: project_id.to_string(),
            profile_id: None,
            talent_name: Some("Jo Talent".to_string()),
            status: Some(BookingStatus::Confirmed),
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Orphan repair
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_role_is_repaired_by_name(pool: PgPool) {
    let project_id = seed_project(&pool, "Harbor Lights").await;
    let old_role = seed_role(&pool, &project_id, "Bartender").await;
    let submission_id = seed_submission(&pool, "user-1", &old_role, &project_id, "Bartender").await;
    seed_booking(&pool, &old_role, &project_id).await;

    assert!(RoleRepo::hard_delete(&pool, &old_role).await.unwrap());
    let new_role = seed_role(&pool, &project_id, "bartender").await;

    let store = PgEntityStore::new(pool.clone());
    let report = scan_for_orphans(&store).await.unwrap();
    assert_eq!(report.orphaned_bookings.len(), 1);
    assert_eq!(report.orphaned_submissions.len(), 1);

    let roles = store.list_roles(casting_core::store::RowFilter::All).await.unwrap();
    let mappings = auto_match(&report, &roles).mapping_set();
    assert_eq!(mappings.get(&old_role), Some(new_role.as_str()));

    let outcome = repair(&store, &mappings, chrono::Utc::now()).await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.bookings_updated, 1);
    assert_eq!(outcome.submissions_updated, 1);

    let row = SubmissionRepo::find_by_id(&pool, &submission_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.role_id.as_deref(), Some(new_role.as_str()));
    assert!(scan_for_orphans(&store).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_repair_twice_changes_nothing_the_second_time(pool: PgPool) {
    let project_id = seed_project(&pool, "Night Shift").await;
    let new_role = seed_role(&pool, &project_id, "Nurse").await;
    seed_submission(&pool, "user-1", "gone-role", &project_id, "Nurse").await;

    let store = PgEntityStore::new(pool.clone());
    let mut mappings = MappingSet::new();
    mappings.set("gone-role", &new_role).unwrap();

    let first = repair(&store, &mappings, chrono::Utc::now()).await;
    let second = repair(&store, &mappings, chrono::Utc::now()).await;
    assert_eq!(first.total_updated(), 1);
    assert_eq!(second.total_updated(), 0);
    assert!(second.is_complete());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_talent_submission_stays_on_old_role(pool: PgPool) {
    let project_id = seed_project(&pool, "Second Take").await;
    let old_role = seed_role(&pool, &project_id, "Bartender").await;
    let first_try = seed_submission(&pool, "user-1", &old_role, &project_id, "Bartender").await;
    let other = seed_submission(&pool, "user-2", &old_role, &project_id, "Bartender").await;
    seed_booking(&pool, &old_role, &project_id).await;

    assert!(RoleRepo::hard_delete(&pool, &old_role).await.unwrap());
    let new_role = seed_role(&pool, &project_id, "Bartender").await;
    seed_submission(&pool, "user-1", &new_role, &project_id, "Bartender").await;

    let store = PgEntityStore::new(pool.clone());
    let mut mappings = MappingSet::new();
    mappings.set(old_role.as_str(), new_role.as_str()).unwrap();
    mappings.set("gone-role", new_role.as_str()).unwrap();

    let report = repair(&store, &mappings, chrono::Utc::now()).await;

    assert!(report.failure().is_none());
    assert_eq!(report.outcomes[0].state, MappingState::Applied);
    assert_eq!(report.outcomes[0].conflicting_submission_ids, [first_try.clone()]);
    assert_eq!(report.bookings_updated, 1);
    assert_eq!(report.submissions_updated, 1);
    assert_eq!(report.outcomes[1].state, MappingState::Applied);

    let moved = SubmissionRepo::find_by_id(&pool, &other).await.unwrap().unwrap();
    assert_eq!(moved.role_id.as_deref(), Some(new_role.as_str()));
    let kept = SubmissionRepo::find_by_id(&pool, &first_try).await.unwrap().unwrap();
    assert_eq!(kept.role_id.as_deref(), Some(old_role.as_str()));
}

// ---------------------------------------------------------------------------
// Archive / restore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_archive_and_restore_project_round_trip(pool: PgPool) {
    let project_id = seed_project(&pool, "Coastline").await;
    let lead = seed_role(&pool, &project_id, "Lead").await;
    let extra = seed_role(&pool, &project_id, "Extra").await;
    let lead_sub = seed_submission(&pool, "user-1", &lead, &project_id, "Lead").await;
    let extra_sub = seed_submission(&pool, "user-2", &extra, &project_id, "Extra").await;
    let booking_id = seed_booking(&pool, &lead, &project_id).await;

    let store = PgEntityStore::new(pool.clone());
    archive_role(&store, &extra, Some("admin-1"), Some("Cut from script"), chrono::Utc::now())
        .await
        .unwrap();

    let report = archive_project(&store, &project_id, chrono::Utc::now()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.roles, CollectionOutcome::Updated { count: 2 });

    let project = ProjectRepo::find_by_id(&pool, &project_id).await.unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Archived.as_str());
    let booking = BookingRepo::list_by_project(&pool, &project_id).await.unwrap();
    assert_eq!(booking[0].status, BookingStatus::Completed.as_str());

    restore_project(&store, &project_id, chrono::Utc::now()).await.unwrap();

    let lead_row = RoleRepo::find_by_id(&pool, &lead).await.unwrap().unwrap();
    assert_eq!(lead_row.status, RoleStatus::Booking.as_str());
    assert!(!lead_row.archived_with_project);

    let extra_row = RoleRepo::find_by_id(&pool, &extra).await.unwrap().unwrap();
    assert_eq!(extra_row.status, RoleStatus::Archived.as_str());
    assert!(extra_row.archived_individually);
    assert_eq!(extra_row.archive_reason.as_deref(), Some("Cut from script"));
    assert_eq!(extra_row.archived_by.as_deref(), Some("admin-1"));

    let lead_sub = SubmissionRepo::find_by_id(&pool, &lead_sub).await.unwrap().unwrap();
    assert_eq!(lead_sub.status.as_deref(), Some(SubmissionStatus::Selected.as_str()));
    let extra_sub = SubmissionRepo::find_by_id(&pool, &extra_sub).await.unwrap().unwrap();
    assert_eq!(extra_sub.status.as_deref(), Some(SubmissionStatus::Selected.as_str()));
    assert!(!extra_sub.archived_with_project);

    let bookings = BookingRepo::list_by_project(&pool, &project_id).await.unwrap();
    assert_eq!(bookings[0].id, booking_id);
    assert_eq!(bookings[0].status, BookingStatus::Confirmed.as_str());
    assert!(!bookings[0].archived_with_project);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_archive_survives_missing_bookings_table(pool: PgPool) {
    let project_id = seed_project(&pool, "Legacy-free").await;
    seed_role(&pool, &project_id, "Lead").await;
    sqlx::query("DROP TABLE bookings").execute(&pool).await.unwrap();

    let store = PgEntityStore::new(pool.clone());
    let report = archive_project(&store, &project_id, chrono::Utc::now()).await.unwrap();

    assert_eq!(report.bookings, CollectionOutcome::Missing);
    assert_eq!(report.roles, CollectionOutcome::Updated { count: 1 });
}

// ---------------------------------------------------------------------------
// Constraints and side tables
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_submission_violates_unique_constraint(pool: PgPool) {
    let project_id = seed_project(&pool, "Dupes").await;
    let role_id = seed_role(&pool, &project_id, "Lead").await;
    seed_submission(&pool, "user-1", &role_id, &project_id, "Lead").await;

    let err = SubmissionRepo::create(
        &pool,
        &CreateSubmission {
            user_id: "user-1".to_string(),
            role_id: role_id.clone(),
            project_id: project_id.clone(),
            profile_id: None,
            role_name: Some("Lead".to_string()),
        },
    )
    .await
    .unwrap_err();

    let mapped = casting_db::error::store_error("submissions", err);
    assert_matches!(
        mapped,
        StoreError::Constraint { constraint, .. } if constraint == "uq_submissions_user_role"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_profile_photos_are_listed_by_profile(pool: PgPool) {
    let profile = ProfileRepo::create(
        &pool,
        &CreateProfile {
            user_id: "user-9".to_string(),
            basic_info: Some(serde_json::json!({ "first_name": "Sam" })),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(profile.sizes, serde_json::json!({}));

    for photo_type in ["headshot", "fullbody"] {
        PhotoRepo::create(
            &pool,
            &CreatePhoto {
                user_id: "user-9".to_string(),
                profile_id: Some(profile.id.clone()),
                photo_type: photo_type.to_string(),
                storage_path: format!("photos/user-9/{photo_type}.jpg"),
            },
        )
        .await
        .unwrap();
    }

    let found = ProfileRepo::find_by_user_id(&pool, "user-9").await.unwrap().unwrap();
    let photos = PhotoRepo::list_by_profile(&pool, &found.id).await.unwrap();
    assert_eq!(photos.len(), 2);
}
