//! Repository for the `photos` table.

use sqlx::PgPool;

use crate::models::photo::{CreatePhoto, Photo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, profile_id, photo_type, storage_path, created_at";

/// Provides queries for photo metadata.
pub struct PhotoRepo;

impl PhotoRepo {
    pub async fn create(pool: &PgPool, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos (id, user_id, profile_id, photo_type, storage_path)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(crate::new_id())
            .bind(&input.user_id)
            .bind(&input.profile_id)
            .bind(&input.photo_type)
            .bind(&input.storage_path)
            .fetch_one(pool)
            .await
    }

    /// Photos attached to a profile, oldest first.
    pub async fn list_by_profile(
        pool: &PgPool,
        profile_id: &str,
    ) -> Result<Vec<Photo>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM photos WHERE profile_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Photo>(&query)
            .bind(profile_id)
            .fetch_all(pool)
            .await
    }
}
