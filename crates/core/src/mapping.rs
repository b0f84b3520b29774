//! Old-role to new-role mappings.
//!
//! Auto-matching is deliberately narrow: an orphaned role id is mapped only
//! when its denormalized name matches exactly one current role name,
//! ignoring case and surrounding whitespace. Anything else is left for the
//! operator. Nothing here writes to the store.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::orphan::OrphanReport;
use crate::store::RoleRecord;
use crate::types::EntityId;

/// A single `old_role_id -> new_role_id` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub old_role_id: EntityId,
    pub new_role_id: EntityId,
}

/// Parse the `<old>:<new>` form used on the command line.
pub fn parse_mapping(raw: &str) -> Result<RoleMapping, CoreError> {
    let Some((old, new)) = raw.split_once(':') else {
        return Err(CoreError::Validation(format!(
            "Mapping '{raw}' must look like <oldRoleId>:<newRoleId>"
        )));
    };
    let mapping = RoleMapping {
        old_role_id: old.trim().to_string(),
        new_role_id: new.trim().to_string(),
    };
    validate_mapping(&mapping.old_role_id, &mapping.new_role_id)?;
    Ok(mapping)
}

fn validate_mapping(old: &str, new: &str) -> Result<(), CoreError> {
    if old.is_empty() || new.is_empty() {
        return Err(CoreError::Validation(
            "Both old and new role ids are required".into(),
        ));
    }
    if old == new {
        return Err(CoreError::Validation(format!(
            "Role {old} cannot be mapped onto itself"
        )));
    }
    Ok(())
}

/// The finalized mappings handed to the repointer: at most one new id per
/// old id, in insertion order. A later `set` for the same old id wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSet {
    entries: IndexMap<EntityId, EntityId>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a list, applying entries in order.
    pub fn from_mappings<I>(mappings: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = RoleMapping>,
    {
        let mut set = Self::new();
        for m in mappings {
            set.set(m.old_role_id, m.new_role_id)?;
        }
        Ok(set)
    }

    /// Set or overwrite the target for `old_role_id`, returning the previous one.
    pub fn set(
        &mut self,
        old_role_id: impl Into<EntityId>,
        new_role_id: impl Into<EntityId>,
    ) -> Result<Option<EntityId>, CoreError> {
        let old_role_id = old_role_id.into().trim().to_string();
        let new_role_id = new_role_id.into().trim().to_string();
        validate_mapping(&old_role_id, &new_role_id)?;
        Ok(self.entries.insert(old_role_id, new_role_id))
    }

    pub fn remove(&mut self, old_role_id: &str) -> Option<EntityId> {
        self.entries.shift_remove(old_role_id)
    }

    pub fn get(&self, old_role_id: &str) -> Option<&str> {
        self.entries.get(old_role_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(o, n)| (o.as_str(), n.as_str()))
    }

    pub fn to_vec(&self) -> Vec<RoleMapping> {
        self.iter()
            .map(|(old, new)| RoleMapping {
                old_role_id: old.to_string(),
                new_role_id: new.to_string(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Auto-matching
// ---------------------------------------------------------------------------

/// A mapping proposed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoMapping {
    pub old_role_id: EntityId,
    pub role_name: String,
    pub new_role_id: EntityId,
    pub new_role_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No orphan pointing at this id stored a role name.
    NoNameHint,
    /// No current role has the hinted name.
    NoCandidate,
    /// More than one current role could be the replacement.
    Ambiguous { candidates: Vec<EntityId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRole {
    pub old_role_id: EntityId,
    pub role_name: Option<String>,
    #[serde(flatten)]
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoMatchOutcome {
    pub mappings: Vec<AutoMapping>,
    pub unresolved: Vec<UnresolvedRole>,
}

impl AutoMatchOutcome {
    /// The proposals as a mapping set, ready for operator edits.
    ///
    /// Proposals only target roles that exist, so they never map an id onto
    /// itself and skip the validation `MappingSet::set` performs.
    pub fn mapping_set(&self) -> MappingSet {
        MappingSet {
            entries: self
                .mappings
                .iter()
                .map(|m| (m.old_role_id.clone(), m.new_role_id.clone()))
                .collect(),
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Propose mappings for every distinct orphaned role id.
pub fn auto_match(report: &OrphanReport, roles: &[RoleRecord]) -> AutoMatchOutcome {
    let mut by_name: IndexMap<String, Vec<&RoleRecord>> = IndexMap::new();
    for role in roles {
        by_name.entry(normalize_name(&role.name)).or_default().push(role);
    }

    let mut outcome = AutoMatchOutcome::default();
    for orphan in report.distinct_role_ids() {
        let role_name = orphan.display_name().map(str::to_string);
        if orphan.name_hints.is_empty() {
            outcome.unresolved.push(UnresolvedRole {
                old_role_id: orphan.old_role_id,
                role_name,
                reason: UnresolvedReason::NoNameHint,
            });
            continue;
        }

        // Every hint for this id must agree on a single replacement.
        let mut unique: Vec<&RoleRecord> = Vec::new();
        let mut ambiguous: Vec<EntityId> = Vec::new();
        for hint in &orphan.name_hints {
            match by_name.get(&normalize_name(hint)).map(Vec::as_slice) {
                Some(&[only]) => {
                    if !unique.iter().any(|r| r.id == only.id) {
                        unique.push(only);
                    }
                }
                Some(many) if many.len() > 1 => {
                    ambiguous.extend(many.iter().map(|r| r.id.clone()));
                }
                _ => {}
            }
        }

        match (unique.as_slice(), ambiguous.is_empty()) {
            ([target], true) => outcome.mappings.push(AutoMapping {
                old_role_id: orphan.old_role_id,
                role_name: role_name.unwrap_or_default(),
                new_role_id: target.id.clone(),
                new_role_name: target.name.clone(),
            }),
            ([], true) => outcome.unresolved.push(UnresolvedRole {
                old_role_id: orphan.old_role_id,
                role_name,
                reason: UnresolvedReason::NoCandidate,
            }),
            _ => {
                let mut candidates: Vec<EntityId> =
                    unique.iter().map(|r| r.id.clone()).collect();
                for id in ambiguous {
                    if !candidates.contains(&id) {
                        candidates.push(id);
                    }
                }
                outcome.unresolved.push(UnresolvedRole {
                    old_role_id: orphan.old_role_id,
                    role_name,
                    reason: UnresolvedReason::Ambiguous { candidates },
                });
            }
        }
    }

    tracing::debug!(
        proposed = outcome.mappings.len(),
        unresolved = outcome.unresolved.len(),
        "Auto-match finished",
    );
    outcome
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::memory::fixtures;
    use crate::orphan::find_orphans;

    fn report_for(submissions: &[crate::store::SubmissionRecord]) -> OrphanReport {
        find_orphans(&[], &[], submissions)
    }

    #[test]
    fn unique_case_insensitive_match_is_proposed() {
        let roles = [fixtures::role("r2", "p1", "BARTENDER"), fixtures::role("r3", "p1", "Chef")];
        let report = report_for(&[fixtures::named_submission("s1", "r1", "p1", "bartender ")]);

        let outcome = auto_match(&report, &roles);

        assert_eq!(outcome.mappings.len(), 1);
        assert_eq!(outcome.mappings[0].old_role_id, "r1");
        assert_eq!(outcome.mappings[0].new_role_id, "r2");
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn multiple_candidates_yield_no_mapping() {
        let roles = [
            fixtures::role("r2", "p1", "Bartender"),
            fixtures::role("r3", "p2", "bartender"),
        ];
        let report = report_for(&[fixtures::named_submission("s1", "r1", "p1", "Bartender")]);

        let outcome = auto_match(&report, &roles);

        assert!(outcome.mappings.is_empty());
        assert_matches!(
            &outcome.unresolved[0].reason,
            UnresolvedReason::Ambiguous { candidates } if candidates == &["r2", "r3"]
        );
    }

    #[test]
    fn no_candidate_and_no_hint_are_unresolved() {
        let roles = [fixtures::role("r2", "p1", "Chef")];
        let report = report_for(&[
            fixtures::named_submission("s1", "r1", "p1", "Bartender"),
            fixtures::submission("s2", "r9", "p1", None),
        ]);

        let outcome = auto_match(&report, &roles);

        assert!(outcome.mappings.is_empty());
        assert_eq!(outcome.unresolved[0].reason, UnresolvedReason::NoCandidate);
        assert_eq!(outcome.unresolved[1].reason, UnresolvedReason::NoNameHint);
    }

    #[test]
    fn no_fuzzy_matching() {
        let roles = [fixtures::role("r2", "p1", "Bartender (Lead)")];
        let report = report_for(&[fixtures::named_submission("s1", "r1", "p1", "Bartender")]);
        assert!(auto_match(&report, &roles).mappings.is_empty());
    }

    #[test]
    fn conflicting_hints_for_one_id_are_ambiguous() {
        let roles = [
            fixtures::role("r2", "p1", "Bartender"),
            fixtures::role("r3", "p1", "Barback"),
        ];
        let report = report_for(&[
            fixtures::named_submission("s1", "r1", "p1", "Bartender"),
            fixtures::named_submission("s2", "r1", "p1", "Barback"),
        ]);

        let outcome = auto_match(&report, &roles);
        assert!(outcome.mappings.is_empty());
        assert_matches!(outcome.unresolved[0].reason, UnresolvedReason::Ambiguous { .. });
    }

    #[test]
    fn proposals_become_mapping_set_in_discovery_order() {
        let roles = [fixtures::role("r2", "p1", "Bartender"), fixtures::role("r4", "p1", "Chef")];
        let report = report_for(&[
            fixtures::named_submission("s1", "r3", "p1", "Chef"),
            fixtures::named_submission("s2", "r1", "p1", "Bartender"),
            fixtures::submission("s3", "r9", "p1", None),
        ]);

        let set = auto_match(&report, &roles).mapping_set();

        let pairs: Vec<_> = set.iter().collect();
        assert_eq!(pairs, [("r3", "r4"), ("r1", "r2")]);
    }

    #[test]
    fn manual_override_replaces_auto_proposal() {
        let roles = [fixtures::role("r2", "p1", "Bartender")];
        let report = report_for(&[fixtures::named_submission("s1", "r1", "p1", "Bartender")]);
        let mut set = auto_match(&report, &roles).mapping_set();

        let previous = set.set("r1", "r7").unwrap();

        assert_eq!(previous.as_deref(), Some("r2"));
        assert_eq!(set.get("r1"), Some("r7"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_mappings_is_last_write_wins() {
        let set = MappingSet::from_mappings([
            RoleMapping { old_role_id: "a".into(), new_role_id: "b".into() },
            RoleMapping { old_role_id: "c".into(), new_role_id: "d".into() },
            RoleMapping { old_role_id: "a".into(), new_role_id: "e".into() },
        ])
        .unwrap();
        let pairs: Vec<_> = set.iter().collect();
        assert_eq!(pairs, [("a", "e"), ("c", "d")]);
    }

    #[test]
    fn parse_mapping_accepts_old_new_pairs() {
        let m = parse_mapping("old123:new456").unwrap();
        assert_eq!(m.old_role_id, "old123");
        assert_eq!(m.new_role_id, "new456");

        assert_matches!(parse_mapping("old123"), Err(CoreError::Validation(_)));
        assert_matches!(parse_mapping(":new"), Err(CoreError::Validation(_)));
        assert_matches!(parse_mapping("same:same"), Err(CoreError::Validation(_)));
    }
}
