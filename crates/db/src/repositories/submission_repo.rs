//! Repository for the `submissions` table.

use casting_core::status::SubmissionStatus;
use casting_core::store::SubmissionPatch;
use casting_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::submission::{CreateSubmission, Submission};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, role_id, project_id, profile_id, role_name, status, \
    archived_with_project, created_at, updated_at";

/// Provides queries for submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Insert a new, unreviewed submission.
    ///
    /// A second submission by the same user to the same role violates
    /// `uq_submissions_user_role`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSubmission,
    ) -> Result<Submission, sqlx::Error> {
        let query = format!(
            "INSERT INTO submissions (id, user_id, role_id, project_id, profile_id, role_name)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(crate::new_id())
            .bind(&input.user_id)
            .bind(&input.role_id)
            .bind(&input.project_id)
            .bind(&input.profile_id)
            .bind(&input.role_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM submissions WHERE id = $1");
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Submission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM submissions ORDER BY created_at, id");
        sqlx::query_as::<_, Submission>(&query).fetch_all(pool).await
    }

    pub async fn list_by_role(
        pool: &PgPool,
        role_id: &str,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM submissions WHERE role_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Submission>(&query)
            .bind(role_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM submissions WHERE project_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Set the review status of one submission. `None` clears it.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn set_status(
        pool: &PgPool,
        id: &str,
        status: Option<SubmissionStatus>,
        updated_at: Timestamp,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "UPDATE submissions SET status = $2, updated_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .bind(status.map(|s| s.as_str()))
            .bind(updated_at)
            .fetch_optional(pool)
            .await
    }

    /// Apply a patch to every submission in `ids`. `status: Some(None)`
    /// resets the status to NULL.
    pub async fn apply_patch(
        pool: &PgPool,
        ids: &[String],
        patch: &SubmissionPatch,
    ) -> Result<u64, sqlx::Error> {
        let (touch_status, status) = match patch.status {
            Some(status) => (true, status.map(|s| s.as_str())),
            None => (false, None),
        };
        let result = sqlx::query(
            "UPDATE submissions SET
                status = CASE WHEN $2 THEN $3 ELSE status END,
                archived_with_project = COALESCE($4, archived_with_project),
                updated_at = $5
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(touch_status)
        .bind(status)
        .bind(patch.archived_with_project)
        .bind(patch.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Rewrite `role_id` on the listed submissions inside `tx`. Rows that no
    /// longer point at `old_role_id` are skipped.
    pub async fn repoint_role(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ids: &[String],
        old_role_id: &str,
        new_role_id: &str,
        updated_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET role_id = $3, updated_at = $4
             WHERE id = ANY($1) AND role_id = $2",
        )
        .bind(ids)
        .bind(old_role_id)
        .bind(new_role_id)
        .bind(updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}
