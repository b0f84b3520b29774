//! Project entity model and DTOs.

use casting_core::status::ProjectStatus;
use casting_core::store::{ProjectRecord, StoreError, COLLECTION_PROJECTS};
use casting_core::types::{EntityId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::decode_error;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: EntityId,
    pub title: String,
    pub project_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project. New projects always start in `booking`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub project_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<Project> for ProjectRecord {
    type Error = StoreError;

    fn try_from(row: Project) -> Result<Self, Self::Error> {
        let status: ProjectStatus = row
            .status
            .parse()
            .map_err(|e| decode_error(COLLECTION_PROJECTS, &row.id, e))?;
        Ok(ProjectRecord {
            id: row.id,
            title: row.title,
            status,
        })
    }
}
