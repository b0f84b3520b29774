//! Photo metadata. The image bytes live in object storage at `storage_path`.

use casting_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A photo row from the `photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: EntityId,
    pub user_id: EntityId,
    pub profile_id: Option<EntityId>,
    /// One of `headshot`, `fullbody`, `portfolio`.
    pub photo_type: String,
    pub storage_path: String,
    pub created_at: Timestamp,
}

/// DTO for recording an uploaded photo.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhoto {
    pub user_id: EntityId,
    pub profile_id: Option<EntityId>,
    pub photo_type: String,
    pub storage_path: String,
}
