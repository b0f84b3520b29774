//! Repository for the `roles` table.

use casting_core::store::RolePatch;
use sqlx::PgPool;

use crate::models::role::{CreateRole, Role};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, requirements, rate, booking_dates, location, \
    status, archived_with_project, archived_individually, archive_reason, archived_at, \
    archived_by, created_at, updated_at";

/// Provides queries for roles.
pub struct RoleRepo;

impl RoleRepo {
    /// Insert a new role under `project_id` in the `booking` state.
    pub async fn create(
        pool: &PgPool,
        project_id: &str,
        input: &CreateRole,
    ) -> Result<Role, sqlx::Error> {
        let query = format!(
            "INSERT INTO roles (id, project_id, name, requirements, rate, booking_dates, location)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(crate::new_id())
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.requirements)
            .bind(&input.rate)
            .bind(&input.booking_dates)
            .bind(&input.location)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every role regardless of status, in creation order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles ORDER BY created_at, id");
        sqlx::query_as::<_, Role>(&query).fetch_all(pool).await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<Role>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM roles WHERE project_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Role>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a patch to every role in `ids`. `None` fields keep their value;
    /// `archive: Some(None)` clears the archive metadata.
    pub async fn apply_patch(
        pool: &PgPool,
        ids: &[String],
        patch: &RolePatch,
    ) -> Result<u64, sqlx::Error> {
        let (touch_archive, meta) = match &patch.archive {
            Some(meta) => (true, meta.as_ref()),
            None => (false, None),
        };
        let result = sqlx::query(
            "UPDATE roles SET
                status = COALESCE($2, status),
                archived_with_project = COALESCE($3, archived_with_project),
                archived_individually = COALESCE($4, archived_individually),
                archive_reason = CASE WHEN $5 THEN $6 ELSE archive_reason END,
                archived_at = CASE WHEN $5 THEN $7 ELSE archived_at END,
                archived_by = CASE WHEN $5 THEN $8 ELSE archived_by END,
                updated_at = $9
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.archived_with_project)
        .bind(patch.archived_individually)
        .bind(touch_archive)
        .bind(meta.and_then(|m| m.reason.clone()))
        .bind(meta.map(|m| m.archived_at))
        .bind(meta.and_then(|m| m.archived_by.clone()))
        .bind(patch.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete a role. Its bookings and submissions are left in
    /// place and become orphans. Returns `true` if a row was removed.
    pub async fn hard_delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
