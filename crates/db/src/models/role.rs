//! Role entity model and DTOs.

use casting_core::status::RoleStatus;
use casting_core::store::{ArchiveMeta, RoleRecord, StoreError, COLLECTION_ROLES};
use casting_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::decode_error;

/// A role row from the `roles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: EntityId,
    pub project_id: EntityId,
    pub name: String,
    pub requirements: Option<String>,
    pub rate: Option<String>,
    pub booking_dates: Vec<NaiveDate>,
    pub location: Option<String>,
    pub status: String,
    pub archived_with_project: bool,
    pub archived_individually: bool,
    pub archive_reason: Option<String>,
    pub archived_at: Option<Timestamp>,
    pub archived_by: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new role. The project id comes from the route.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub requirements: Option<String>,
    pub rate: Option<String>,
    #[serde(default)]
    pub booking_dates: Vec<NaiveDate>,
    pub location: Option<String>,
}

impl TryFrom<Role> for RoleRecord {
    type Error = StoreError;

    fn try_from(row: Role) -> Result<Self, Self::Error> {
        let status: RoleStatus = row
            .status
            .parse()
            .map_err(|e| decode_error(COLLECTION_ROLES, &row.id, e))?;
        // Metadata only counts once a timestamp was recorded.
        let archive = row.archived_at.map(|archived_at| ArchiveMeta {
            reason: row.archive_reason,
            archived_at,
            archived_by: row.archived_by,
        });
        Ok(RoleRecord {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            status,
            archived_with_project: row.archived_with_project,
            archived_individually: row.archived_individually,
            archive,
        })
    }
}
