//! Repository for the `projects` table.

use casting_core::status::ProjectStatus;
use casting_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, title, project_type, start_date, end_date, status, created_at, updated_at";

/// Provides queries for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in the `booking` state, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (id, title, project_type, start_date, end_date, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(crate::new_id())
            .bind(&input.title)
            .bind(&input.project_type)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(ProjectStatus::Booking.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects, most recently created first. Archived projects are
    /// only included when `include_archived` is set.
    pub async fn list(pool: &PgPool, include_archived: bool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE $1 OR status <> $2
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(include_archived)
            .bind(ProjectStatus::Archived.as_str())
            .fetch_all(pool)
            .await
    }

    /// Overwrite the status column. Returns `true` if a row was updated.
    pub async fn set_status(
        pool: &PgPool,
        id: &str,
        status: ProjectStatus,
        updated_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE projects SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(updated_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
