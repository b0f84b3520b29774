use std::io::Cursor;

use assert_matches::assert_matches;
use casting_core::memory::{fixtures, MemoryStore};
use casting_core::repoint::MappingState;
use casting_core::status::ProjectStatus;
use casting_repair::{run, Outcome, RepairArgs};
use clap::Parser;

async fn session(
    store: &MemoryStore,
    argv: &[&str],
    input: &str,
) -> (anyhow::Result<Outcome>, String) {
    let args = RepairArgs::try_parse_from(argv).unwrap();
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut output = Vec::new();
    let outcome = run(&args, store, &mut input, &mut output).await;
    (outcome, String::from_utf8(output).unwrap())
}

/// Role `r1` ("Bartender") was deleted and recreated as `r2`.
fn recreated_role_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_project(fixtures::project("p1", ProjectStatus::Booking));
    store.insert_role(fixtures::role("r2", "p1", "Bartender"));
    store.insert_booking(fixtures::booking("b1", "r1", "p1"));
    store.insert_submission(fixtures::named_submission("s1", "r1", "p1", "Bartender"));
    store
}

#[tokio::test]
async fn quick_mode_repoints_without_prompting() {
    let store = MemoryStore::new();
    store.insert_project(fixtures::project("p1", ProjectStatus::Booking));
    store.insert_role(fixtures::role("new456", "p1", "Lead"));
    store.insert_booking(fixtures::booking("b1", "old123", "p1"));
    store.insert_booking(fixtures::booking("b2", "old123", "p1"));
    store.insert_submission(fixtures::submission("s1", "old123", "p1", None));

    let (outcome, output) = session(&store, &["role-repair", "--quick", "old123:new456"], "").await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert_matches!(&outcome, Outcome::Repaired(report) if report.total_updated() == 3);
    assert!(output.contains("3 total"));
    for id in ["b1", "b2"] {
        assert_eq!(store.booking(id).unwrap().role_id.as_deref(), Some("new456"));
    }
    assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("new456"));
}

#[tokio::test]
async fn quick_mode_requires_an_existing_target() {
    let store = recreated_role_store();

    let (outcome, _) = session(&store, &["role-repair", "--quick", "r1:nope"], "").await;

    let err = outcome.unwrap_err();
    assert!(err.to_string().contains("nope"));
    assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn clean_store_has_nothing_to_do() {
    let store = MemoryStore::new();
    store.insert_role(fixtures::role("r1", "p1", "Bartender"));
    store.insert_booking(fixtures::booking("b1", "r1", "p1"));

    let (outcome, output) = session(&store, &["role-repair"], "").await;

    assert_eq!(outcome.unwrap(), Outcome::NothingToDo);
    assert!(output.contains("No orphaned bookings or submissions found."));
}

#[tokio::test]
async fn accepting_the_proposal_repairs_orphans() {
    let store = recreated_role_store();

    let (outcome, output) = session(&store, &["role-repair"], "\ny\n").await;

    let outcome = outcome.unwrap();
    assert_matches!(&outcome, Outcome::Repaired(report) if report.is_complete());
    assert_eq!(outcome.exit_code(), 0);
    assert!(output.contains("r1 (Bartender) -> r2 (Bartender)"));
    assert!(output.contains("New role id [r2]"));
    assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r2"));
    assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("r2"));
}

#[tokio::test]
async fn declining_confirmation_writes_nothing() {
    let store = recreated_role_store();
    let before = (store.bookings(), store.submissions());

    let (outcome, output) = session(&store, &["role-repair"], "\nn\n").await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(outcome.exit_code(), 0);
    assert!(output.contains("no changes made"));
    assert_eq!((store.bookings(), store.submissions()), before);
}

#[tokio::test]
async fn end_of_input_cancels() {
    let store = recreated_role_store();

    let (outcome, _) = session(&store, &["role-repair"], "").await;

    assert_eq!(outcome.unwrap(), Outcome::Cancelled);
    assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn ambiguous_role_is_mapped_by_hand() {
    let store = recreated_role_store();
    store.insert_role(fixtures::role("r3", "p1", "Bartender"));

    let (outcome, output) = session(&store, &["role-repair"], "r3\ny\n").await;

    assert!(output.contains("several candidates: r2, r3"));
    assert_matches!(outcome.unwrap(), Outcome::Repaired(report) if report.total_updated() == 2);
    assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("r3"));
}

#[tokio::test]
async fn unknown_role_id_prompts_again() {
    let store = recreated_role_store();

    let (outcome, output) = session(&store, &["role-repair"], "bogus\nr1\nr2\ny\n").await;

    assert!(output.contains("No role with id bogus; try again."));
    // r1 no longer exists, so it is rejected as unknown too.
    assert!(output.contains("No role with id r1; try again."));
    assert_matches!(outcome.unwrap(), Outcome::Repaired(_));
    assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r2"));
}

#[tokio::test]
async fn skipping_every_role_has_nothing_to_do() {
    let store = recreated_role_store();

    let (outcome, output) = session(&store, &["role-repair"], "-\n").await;

    assert_eq!(outcome.unwrap(), Outcome::NothingToDo);
    assert!(output.contains("No mappings selected"));
    assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn partial_failure_exits_nonzero() {
    let store = MemoryStore::new();
    store.insert_role(fixtures::role("a2", "p1", "Extra"));
    store.insert_role(fixtures::role("b2", "p1", "Lead"));
    store.insert_submission(fixtures::named_submission("s1", "a", "p1", "Extra"));
    store.insert_submission(fixtures::named_submission("s2", "b", "p1", "Lead"));
    store.fail_repoint("b", "connection reset");

    let (outcome, output) = session(&store, &["role-repair"], "\n\ny\n").await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome.exit_code(), 1);
    let Outcome::Repaired(report) = &outcome else {
        panic!("expected a repair, got {outcome:?}");
    };
    assert_eq!(report.outcomes[0].state, MappingState::Applied);
    assert_matches!(&report.outcomes[1].state, MappingState::Failed { .. });
    assert!(output.contains("Repair stopped early"));
    assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("a2"));
    assert_eq!(store.submission("s2").unwrap().role_id.as_deref(), Some("b"));
}

#[tokio::test]
async fn duplicate_talent_submission_is_left_in_place() {
    let store = recreated_role_store();
    store.insert_submission(casting_core::store::SubmissionRecord {
        user_id: "user-s1".into(),
        ..fixtures::submission("s2", "r2", "p1", None)
    });

    let (outcome, output) = session(&store, &["role-repair", "--quick", "r1:r2"], "").await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert!(output.contains("left in place: r1 -> r2 submission(s) s1"));
    assert_eq!(store.booking("b1").unwrap().role_id.as_deref(), Some("r2"));
    assert_eq!(store.submission("s1").unwrap().role_id.as_deref(), Some("r1"));
}
