//! Repository for the legacy `bookings` table.

use casting_core::status::BookingStatus;
use casting_core::store::BookingPatch;
use casting_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::booking::{Booking, CreateBooking};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, role_id, project_id, profile_id, talent_name, status, \
    archived_with_project, created_at, updated_at";

/// Provides queries for bookings.
pub struct BookingRepo;

impl BookingRepo {
    pub async fn create(pool: &PgPool, input: &CreateBooking) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings
                (id, user_id, role_id, project_id, profile_id, talent_name, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(crate::new_id())
            .bind(&input.user_id)
            .bind(&input.role_id)
            .bind(&input.project_id)
            .bind(&input.profile_id)
            .bind(&input.talent_name)
            .bind(input.status.unwrap_or(BookingStatus::Pending).as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings ORDER BY created_at, id");
        sqlx::query_as::<_, Booking>(&query).fetch_all(pool).await
    }

    pub async fn list_by_role(pool: &PgPool, role_id: &str) -> Result<Vec<Booking>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bookings WHERE role_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Booking>(&query)
            .bind(role_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bookings WHERE project_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Booking>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn apply_patch(
        pool: &PgPool,
        ids: &[String],
        patch: &BookingPatch,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET
                status = COALESCE($2, status),
                archived_with_project = COALESCE($3, archived_with_project),
                updated_at = $4
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.archived_with_project)
        .bind(patch.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Rewrite `role_id` on the listed bookings inside `tx`. Rows that no
    /// longer point at `old_role_id` are skipped.
    pub async fn repoint_role(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ids: &[String],
        old_role_id: &str,
        new_role_id: &str,
        updated_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET role_id = $3, updated_at = $4
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
