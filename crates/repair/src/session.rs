//! One repair session: scan, decide on mappings, confirm, repoint.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use casting_core::mapping::{
    auto_match, AutoMatchOutcome, MappingSet, RoleMapping, UnresolvedReason,
};
use casting_core::orphan::{scan_for_orphans, OrphanReport};
use casting_core::repoint::{repair, MappingState, RepairReport};
use casting_core::store::{EntityStore, RoleRecord, RowFilter};

use crate::cli::RepairArgs;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No orphans, or no mapping was chosen.
    NothingToDo,
    /// The operator declined the final confirmation. Nothing was written.
    Cancelled,
    Repaired(RepairReport),
}

impl Outcome {
    /// Process exit code: 1 only when a repair stopped part-way.
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Repaired(report) if report.failure().is_some() => 1,
            _ => 0,
        }
    }
}

/// Run a session against `store`, reading answers from `input` and writing
/// the transcript to `output`.
pub async fn run<S, R, W>(
    args: &RepairArgs,
    store: &S,
    input: &mut R,
    output: &mut W,
) -> Result<Outcome>
where
    S: EntityStore + ?Sized,
    R: BufRead,
    W: Write,
{
    match &args.quick {
        Some(mapping) => run_quick(store, mapping, output).await,
        None => run_interactive(store, input, output).await,
    }
}

async fn run_quick<S, W>(store: &S, mapping: &RoleMapping, output: &mut W) -> Result<Outcome>
where
    S: EntityStore + ?Sized,
    W: Write,
{
    if store.find_role(&mapping.new_role_id).await?.is_none() {
        bail!("Target role {} does not exist", mapping.new_role_id);
    }

    let mut mappings = MappingSet::new();
    mappings.set(mapping.old_role_id.as_str(), mapping.new_role_id.as_str())?;
    writeln!(
        output,
        "Repointing {} -> {}",
        mapping.old_role_id, mapping.new_role_id
    )?;

    let report = repair(store, &mappings, chrono::Utc::now()).await;
    print_report(output, &report)?;
    Ok(Outcome::Repaired(report))
}

async fn run_interactive<S, R, W>(store: &S, input: &mut R, output: &mut W) -> Result<Outcome>
where
    S: EntityStore + ?Sized,
    R: BufRead,
    W: Write,
{
    let report = scan_for_orphans(store).await.context("Orphan scan failed")?;
    if report.is_empty() {
        writeln!(output, "No orphaned bookings or submissions found.")?;
        return Ok(Outcome::NothingToDo);
    }
    print_orphans(output, &report)?;

    let roles = store.list_roles(RowFilter::All).await?;
    let matched = auto_match(&report, &roles);
    print_proposals(output, &matched)?;

    let mut mappings = matched.mapping_set();
    choose_mappings(input, output, &report, &roles, &mut mappings)?;

    if mappings.is_empty() {
        writeln!(output, "No mappings selected; nothing to do.")?;
        return Ok(Outcome::NothingToDo);
    }

    writeln!(output, "\nMappings to apply:")?;
    for (old, new) in mappings.iter() {
        writeln!(output, "  {old} -> {new}")?;
    }
    let answer = prompt(input, output, &format!("Apply {} mapping(s)? [y/N]: ", mappings.len()))?;
    if !matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "YES")) {
        writeln!(output, "Cancelled; no changes made.")?;
        return Ok(Outcome::Cancelled);
    }

    let report = repair(store, &mappings, chrono::Utc::now()).await;
    print_report(output, &report)?;
    Ok(Outcome::Repaired(report))
}

/// Walk every distinct orphaned role id and let the operator keep, replace
/// or drop its mapping. Blank keeps the proposal; `-` drops it.
fn choose_mappings<R, W>(
    input: &mut R,
    output: &mut W,
    report: &OrphanReport,
    roles: &[RoleRecord],
    mappings: &mut MappingSet,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let role_ids: HashSet<&str> = roles.iter().map(|r| r.id.as_str()).collect();
    writeln!(
        output,
        "\nEnter a new role id for each orphaned role. Blank keeps the proposal, '-' skips."
    )?;

    for orphan in report.distinct_role_ids() {
        let old = orphan.old_role_id.as_str();
        writeln!(
            output,
            "\nRole {old} ({}): {} booking(s), {} submission(s)",
            orphan.display_name().unwrap_or("no name recorded"),
            orphan.booking_count,
            orphan.submission_count,
        )?;

        loop {
            let label = match mappings.get(old) {
                Some(proposed) => format!("  New role id [{proposed}]: "),
                None => "  New role id (blank to skip): ".to_string(),
            };
            let Some(answer) = prompt(input, output, &label)? else {
                break;
            };
            if answer.is_empty() {
                break;
            }
            if answer == "-" {
                mappings.remove(old);
                break;
            }
            if !role_ids.contains(answer.as_str()) {
                writeln!(output, "  No role with id {answer}; try again.")?;
                continue;
            }
            match mappings.set(old, answer.as_str()) {
                Ok(_) => break,
                Err(e) => writeln!(output, "  {e}")?,
            }
        }
    }
    Ok(())
}

/// Print `label` and read one trimmed line. `None` at end of input.
fn prompt<R, W>(input: &mut R, output: &mut W, label: &str) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{label}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_orphans<W: Write>(output: &mut W, report: &OrphanReport) -> Result<()> {
    writeln!(
        output,
        "Found {} orphaned booking(s) and {} orphaned submission(s).",
        report.orphaned_bookings.len(),
        report.orphaned_submissions.len()
    )?;
    for b in &report.orphaned_bookings {
        writeln!(
            output,
            "  booking    {}  role {}  talent {}",
            b.id,
            b.role_id.as_deref().unwrap_or("<none>"),
            b.talent_name.as_deref().unwrap_or("-"),
        )?;
    }
    for s in &report.orphaned_submissions {
        writeln!(
            output,
            "  submission {}  role {}  name {}",
            s.id,
            s.role_id.as_deref().unwrap_or("<none>"),
            s.role_name.as_deref().unwrap_or("-"),
        )?;
    }
    Ok(())
}

fn print_proposals<W: Write>(output: &mut W, matched: &AutoMatchOutcome) -> Result<()> {
    if !matched.mappings.is_empty() {
        writeln!(output, "\nMatched by role name:")?;
        for m in &matched.mappings {
            writeln!(
                output,
                "  {} ({}) -> {} ({})",
                m.old_role_id, m.role_name, m.new_role_id, m.new_role_name
            )?;
        }
    }
    if !matched.unresolved.is_empty() {
        writeln!(output, "\nNo automatic match:")?;
        for u in &matched.unresolved {
            let why = match &u.reason {
                UnresolvedReason::NoNameHint => "no role name recorded".to_string(),
                UnresolvedReason::NoCandidate => "no current role has this name".to_string(),
                UnresolvedReason::Ambiguous { candidates } => {
                    format!("several candidates: {}", candidates.join(", "))
                }
            };
            writeln!(
                output,
                "  {} ({}): {why}",
                u.old_role_id,
                u.role_name.as_deref().unwrap_or("-"),
            )?;
        }
    }
    Ok(())
}

fn print_report<W: Write>(output: &mut W, report: &RepairReport) -> Result<()> {
    for outcome in &report.outcomes {
        let state = match &outcome.state {
            MappingState::Applied => "applied".to_string(),
            MappingState::Failed { message } => format!("FAILED: {message}"),
            MappingState::Conflict { constraint, .. } => {
                format!("not applied, rejected by {constraint}")
            }
            MappingState::Skipped => "skipped".to_string(),
        };
        writeln!(
            output,
            "  {} -> {}: {} booking(s), {} submission(s) {state}",
            outcome.old_role_id,
            outcome.new_role_id,
            outcome.bookings_updated,
            outcome.submissions_updated,
        )?;
    }
    for outcome in report.conflicts() {
        if outcome.conflicting_submission_ids.is_empty() {
            continue;
        }
        writeln!(
            output,
            "  left in place: {} -> {} submission(s) {} (talent already submitted to {})",
            outcome.old_role_id,
            outcome.new_role_id,
            outcome.conflicting_submission_ids.join(", "),
            outcome.new_role_id,
        )?;
    }
    for outcome in report.mismatches() {
        writeln!(
            output,
            "  warning: {} -> {} found {}/{} rows but updated {}/{}",
            outcome.old_role_id,
            outcome.new_role_id,
            outcome.bookings_found,
            outcome.submissions_found,
            outcome.bookings_updated,
            outcome.submissions_updated,
        )?;
    }
    writeln!(
        output,
        "Updated {} booking(s) and {} submission(s), {} total.",
        report.bookings_updated,
        report.submissions_updated,
        report.total_updated()
    )?;
    if report.failure().is_some() {
        writeln!(
            output,
            "Repair stopped early. Earlier mappings were applied; re-run to continue."
        )?;
    }
    Ok(())
}
