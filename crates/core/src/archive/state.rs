//! Archive state of a role.
//!
//! Storage keeps two independent booleans (`archived_with_project`,
//! `archived_individually`); domain code reasons about the four combinations
//! through [`ArchiveState`] so the two archival paths never clobber each other.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveState {
    Active,
    ArchivedByProjectCascade,
    ArchivedIndividually,
    ArchivedBoth,
}

impl ArchiveState {
    pub fn from_flags(with_project: bool, individually: bool) -> Self {
        match (with_project, individually) {
            (false, false) => ArchiveState::Active,
            (true, false) => ArchiveState::ArchivedByProjectCascade,
            (false, true) => ArchiveState::ArchivedIndividually,
            (true, true) => ArchiveState::ArchivedBoth,
        }
    }

    /// `(archived_with_project, archived_individually)` as stored.
    pub fn flags(self) -> (bool, bool) {
        (self.with_project(), self.individually())
    }

    pub fn with_project(self) -> bool {
        matches!(
            self,
            ArchiveState::ArchivedByProjectCascade | ArchiveState::ArchivedBoth
        )
    }

    pub fn individually(self) -> bool {
        matches!(
            self,
            ArchiveState::ArchivedIndividually | ArchiveState::ArchivedBoth
        )
    }

    pub fn is_archived(self) -> bool {
        self != ArchiveState::Active
    }

    /// Set or clear the project-cascade bit, keeping the individual bit.
    pub fn with_project_cascade(self, archived: bool) -> Self {
        Self::from_flags(archived, self.individually())
    }

    /// Set or clear the individual bit, keeping the project-cascade bit.
    pub fn with_individual(self, archived: bool) -> Self {
        Self::from_flags(self.with_project(), archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip() {
        for with_project in [false, true] {
            for individually in [false, true] {
                let state = ArchiveState::from_flags(with_project, individually);
                assert_eq!(state.flags(), (with_project, individually));
            }
        }
    }

    #[test]
    fn clearing_cascade_keeps_individual_archive() {
        let state = ArchiveState::ArchivedBoth.with_project_cascade(false);
        assert_eq!(state, ArchiveState::ArchivedIndividually);
        assert!(state.is_archived());
    }

    #[test]
    fn clearing_individual_keeps_cascade() {
        let state = ArchiveState::ArchivedBoth.with_individual(false);
        assert_eq!(state, ArchiveState::ArchivedByProjectCascade);
        assert_eq!(
            ArchiveState::ArchivedIndividually.with_individual(false),
            ArchiveState::Active
        );
    }
}
