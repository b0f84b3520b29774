//! Repository for the `profiles` table.

use sqlx::PgPool;

use crate::models::profile::{CreateProfile, Profile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, basic_info, appearance, sizes, details, created_at, updated_at";

/// Provides queries for talent profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Insert a profile. Each user has at most one (`uq_profiles_user_id`).
    pub async fn create(pool: &PgPool, input: &CreateProfile) -> Result<Profile, sqlx::Error> {
        let empty = || serde_json::json!({});
        let query = format!(
            "INSERT INTO profiles (id, user_id, basic_info, appearance, sizes, details)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(crate::new_id())
            .bind(&input.user_id)
            .bind(input.basic_info.clone().unwrap_or_else(empty))
            .bind(input.appearance.clone().unwrap_or_else(empty))
            .bind(input.sizes.clone().unwrap_or_else(empty))
            .bind(input.details.clone().unwrap_or_else(empty))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE user_id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
